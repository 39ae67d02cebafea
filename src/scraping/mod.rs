pub mod browser_manager;
pub mod dom_scan;
pub mod renderer;
pub mod static_page;

pub use dom_scan::DomScan;
pub use renderer::{ChromiumRenderer, PageRenderer, RenderSession};
pub use static_page::StaticRenderer;
