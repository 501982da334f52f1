pub mod app;
pub mod auth_modal;
pub mod message_box;
pub mod play_button;
pub mod rank_view;
pub mod stream_page;
pub mod timer_display;
pub mod toast;
pub mod warning_banner;

pub use app::App;
