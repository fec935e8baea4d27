//! CLI smoke entry point.
//!
//! Verifies `experiences_core` linkage and walks one pin-drop session
//! against an in-memory database.

use experiences_core::db::open_db_in_memory;
use experiences_core::{
    core_version, Coordinate, ExperienceRegistry, ExperienceService, MediaKind,
    SqliteExperienceRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("experiences_core version={}", core_version());
    match run_session() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("session failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_session() -> Result<(), Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let mut service = ExperienceService::new(
        ExperienceRegistry::default(),
        SqliteExperienceRepository::new(&conn),
    );

    let park = service.create_experience("Park", "Nice walk", Coordinate::new(40.0, -75.0)?)?;
    service.add_media(park, MediaKind::Image, Some("park.heic".to_string()), None)?;
    service.add_media(park, MediaKind::Audio, Some("park.caf".to_string()), None)?;
    service.edit_metadata(park, "Park Revisited", "Even nicer")?;

    let saved = service.save()?;
    let loaded = service.load()?;
    println!("experiences saved={saved} loaded={loaded}");
    for experience in service.list() {
        println!(
            "experience id={} media={} updated_at_ms={:?}",
            experience.id(),
            experience.media_list().len(),
            experience.updated_at_ms()
        );
    }
    Ok(())
}
