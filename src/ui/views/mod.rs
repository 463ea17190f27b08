mod album_detail;
mod album_list;

pub use album_detail::AlbumDetailView;
pub use album_list::AlbumListView;
