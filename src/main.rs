mod api;
mod components;
mod logger;
mod model;
mod state;
mod streaming;
mod util;

use components::App;

fn main() {
    logger::init();
    log::info!("render streaming front-end starting at {}", util::current_path());
    yew::Renderer::<App>::new().render();
}
