use orbtrack::resolution::PositionResolver;
use orbtrack::tracking::{classify_sunlight, solar_declination};
use orbtrack::{error, info};

/// Single-shot entry point: one resolution cycle per invocation, the way
/// the wallpaper scheduler drives it.
#[tokio::main]
async fn main() {
    let mut resolver = PositionResolver::with_defaults();
    match resolver.resolve_current_fix().await {
        Ok(fix) => {
            let declination = solar_declination(fix.timestamp());
            let sunlight = classify_sunlight(
                fix.latitude(),
                fix.longitude(),
                fix.timestamp(),
                declination,
            );
            info!("current fix: {fix}, ground point in {sunlight:?}");
        }
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    }
}
