mod allocator;

use pmce_stats::app::App;

fn main() -> anyhow::Result<()> {
    App::init()?.execute()
}
