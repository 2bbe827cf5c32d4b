//! This example walks a session through a typical screen lifecycle against the scripted engine:
//! the view appears, the user searches for fuel, plans a route to the first result and then
//! leaves the screen while the route is still being presented.

use std::time::Duration;

use futures::executor::block_on;
use futures::{FutureExt, StreamExt};
use log::info;
use mapsession::engine::{self, SurfaceEvent};
use mapsession::event::EventKind;
use mapsession::model::{Landmark, LandmarkCategory, QueryCode, Route, RouteId, RouteStatus};
use mapsession::operation::query::{RouteRequest, SearchRequest};
use mapsession::testing::ScriptedEngine;
use mapsession::SessionBuilder;
use mapsession_types::latlon;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let scripted = ScriptedEngine::new();
    engine::initialize("demo-token", scripted.clone())?;

    let session = SessionBuilder::from_global()?.build()?;
    let mut states = session.subscribe(EventKind::StateChanged);
    let mut statuses = session.subscribe(EventKind::RouteStatus);

    session.start_render()?;
    session.center_on(latlon!(45.6427, 25.5887), 14, Duration::from_millis(800), |outcome| {
        info!("Camera centered: {outcome:?}")
    })?;
    scripted.finish_animation(true);

    let here = latlon!(45.6427, 25.5887);
    let fuel = session.search_around_async(
        SearchRequest::category(LandmarkCategory::GasStation, here).with_max_matches(3),
    );
    if let Some(&id) = scripted.pending_queries().first() {
        scripted.complete_search(
            id,
            Ok(vec![
                Landmark::new("Rompetrol", latlon!(45.6512, 25.6011))
                    .with_category(LandmarkCategory::GasStation),
                Landmark::new("OMV", latlon!(45.6320, 25.5790))
                    .with_category(LandmarkCategory::GasStation),
            ]),
        );
    }
    let stations = block_on(fuel)?;
    info!("Found {} stations, {} highlighted", stations.len(), session.highlights().len());

    let Some(station) = stations.first() else {
        return Ok(());
    };
    let handle = session.calculate_route(
        RouteRequest::new(vec![here, station.position]),
        |outcome| info!("Route calculation finished: {outcome:?}"),
    )?;
    scripted.report_route_status(handle.id(), RouteStatus::Calculating);
    scripted.report_route_status(handle.id(), RouteStatus::Ready);
    scripted.complete_route(
        handle.id(),
        Route::new(
            RouteId(1),
            vec![here, station.position],
            1_650.0,
            Duration::from_secs(240),
        )
        .map(|route| vec![route])
        .map_err(|_| QueryCode::NO_ROUTE),
    );

    scripted.emit(session.surface_id(), SurfaceEvent::FollowingPositionChanged(false));

    // Leaving the screen interrupts the route presentation.
    session.stop_render()?;
    session.shutdown();

    while let Some(Some(event)) = statuses.next().now_or_never() {
        info!("Route event: {event:?}");
    }
    while let Some(Some(event)) = states.next().now_or_never() {
        info!("State event: {event:?}");
    }

    engine::teardown();
    Ok(())
}
