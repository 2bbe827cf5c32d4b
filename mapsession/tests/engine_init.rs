//! The process-wide engine slot is global, so everything touching it lives in one test.

use assert_matches::assert_matches;
use mapsession::engine;
use mapsession::testing::{EngineCall, ScriptedEngine};
use mapsession::{InitError, SessionBuilder};

#[test]
fn engine_initializes_once() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    assert!(engine::handle().is_none());
    assert!(SessionBuilder::from_global().is_err());

    assert_matches!(
        engine::initialize("  ", ScriptedEngine::new()),
        Err(InitError::EmptyToken)
    );
    assert_matches!(
        engine::initialize("wrong", ScriptedEngine::with_token("secret")),
        Err(InitError::Rejected(_))
    );
    assert!(engine::handle().is_none());

    let scripted = ScriptedEngine::with_token("secret");
    let handle = engine::initialize("secret", scripted.clone())?;
    assert_matches!(
        engine::initialize("secret", ScriptedEngine::new()),
        Err(InitError::AlreadyInitialized)
    );

    let global = engine::handle().expect("engine is initialized");
    assert!(global.same_engine(&handle));

    let session = SessionBuilder::from_global()?.build()?;
    session.start_render()?;
    assert!(scripted.is_rendering(session.surface_id()));

    assert!(engine::teardown());
    assert!(!engine::teardown());
    assert!(engine::handle().is_none());

    // The session keeps the engine alive after the slot is released.
    let surface = session.surface_id();
    session.shutdown();
    assert!(scripted.calls().contains(&EngineCall::DestroySurface(surface)));

    engine::initialize("secret", scripted)?;
    assert!(engine::handle().is_some());

    Ok(())
}
