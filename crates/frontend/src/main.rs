mod app;

use app::App;
use tracing_subscriber::filter::LevelFilter;

fn main() {
    console_error_panic_hook::set_once();
    pnc_frontend_common::logging::init(LevelFilter::INFO);
    yew::Renderer::<App>::new().render();
}
