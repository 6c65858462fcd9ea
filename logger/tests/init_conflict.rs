use slot_logger::logger::{self, Config};

struct Silent;

impl log::Log for Silent {
    fn enabled(&self, _: &log::Metadata) -> bool {
        false
    }

    fn log(&self, _: &log::Record) {}

    fn flush(&self) {}
}

static SILENT: Silent = Silent;

// Runs in its own test binary so the foreign logger does not leak into init.rs.
#[test]
fn test_init_with_foreign_logger() {
    log::set_logger(&SILENT).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(dir.path().join("access.log"), dir.path().join("app.log"));

    assert!(logger::init(config).is_err());
    assert!(logger::slot().is_none());
    assert!(!dir.path().join("app.log").exists());
    assert!(!dir.path().join("access.log").exists());
}
