//! refgraph binary entry point.

use refgraph::ui::output;

fn main() {
    if let Err(e) = refgraph::cli::run() {
        output::error(format!("{:#}", e));
        std::process::exit(1);
    }
}
