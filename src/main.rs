mod entry;
mod shutdown_handlers;
mod system;

use loadpulse::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
