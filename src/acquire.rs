//! Pull-versus-cache policy for the server image.

use std::io::Write;

use tracing::{info, warn};

use crate::docker::{ContainerEngine, ImagePresence};
use crate::error::{Result, SessionError};
use crate::tag::is_floating;

/// Make `name:tag` available locally.
///
/// Pinned versions reuse a cached image without touching the network. Floating
/// versions are always pulled. A failed pull falls back to a cached copy; only
/// when none exists does acquisition fail.
pub fn ensure_image(
    engine: &dyn ContainerEngine,
    name: &str,
    tag: &str,
    version: &str,
    platform: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let reference = format!("{name}:{tag}");

    if !is_floating(version) && is_cached(engine, &reference) {
        info!("Using cached image {reference}");
        return Ok(());
    }

    info!("Pulling image {reference}...");
    let mut stdout = std::io::stdout();
    let mut markers = 0usize;
    let pulled = engine.pull(name, tag, platform, &mut |_line| {
        if !quiet {
            let _ = write!(stdout, ".");
            let _ = stdout.flush();
            markers += 1;
        }
    });
    if markers > 0 {
        let _ = writeln!(stdout);
    }

    match pulled {
        Ok(()) => {
            info!("Pulled image {reference}");
            Ok(())
        }
        Err(err) if is_cached(engine, &reference) => {
            warn!("Failed to pull {reference} ({err:#}); using cached image");
            Ok(())
        }
        Err(err) => Err(SessionError::Acquisition {
            image: reference,
            source: err.into(),
        }),
    }
}

/// Lookup failures count as "not cached".
fn is_cached(engine: &dyn ContainerEngine, reference: &str) -> bool {
    match engine.image_presence(reference) {
        Ok(presence) => presence == ImagePresence::Found,
        Err(err) => {
            warn!("Could not inspect local image {reference}: {err:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use anyhow::{Result as AnyResult, bail};

    use super::*;
    use crate::docker::{ContainerHandle, RunSpec};

    /// Engine that only knows about images.
    struct ImageStore {
        cached: bool,
        pull_fails: bool,
        pulls: Cell<usize>,
        inspected: RefCell<Vec<String>>,
    }

    impl ImageStore {
        fn new(cached: bool, pull_fails: bool) -> Self {
            Self {
                cached,
                pull_fails,
                pulls: Cell::new(0),
                inspected: RefCell::new(Vec::new()),
            }
        }
    }

    impl ContainerEngine for ImageStore {
        fn image_presence(&self, reference: &str) -> AnyResult<ImagePresence> {
            self.inspected.borrow_mut().push(reference.to_string());
            Ok(if self.cached {
                ImagePresence::Found
            } else {
                ImagePresence::NotFound
            })
        }

        fn pull(
            &self,
            _name: &str,
            _tag: &str,
            _platform: Option<&str>,
            progress: &mut dyn FnMut(&str),
        ) -> AnyResult<()> {
            self.pulls.set(self.pulls.get() + 1);
            progress("Pulling fs layer");
            if self.pull_fails {
                bail!("registry unreachable");
            }
            Ok(())
        }

        fn run(&self, _spec: &RunSpec) -> AnyResult<ContainerHandle> {
            unreachable!("acquisition never starts containers")
        }

        fn logs(&self, _handle: &ContainerHandle) -> AnyResult<String> {
            unreachable!("acquisition never reads logs")
        }

        fn stop(&self, _handle: &ContainerHandle) -> AnyResult<()> {
            unreachable!("acquisition never stops containers")
        }

        fn remove(&self, _handle: &ContainerHandle) -> AnyResult<()> {
            unreachable!("acquisition never removes containers")
        }
    }

    #[test]
    fn pinned_cached_image_skips_pull() {
        let engine = ImageStore::new(true, false);
        ensure_image(&engine, "rstudio/rstudio-connect", "jammy-2025.09.0", "2025.09.0", None, true)
            .unwrap();
        assert_eq!(engine.pulls.get(), 0);
        assert_eq!(
            engine.inspected.borrow().as_slice(),
            ["rstudio/rstudio-connect:jammy-2025.09.0"]
        );
    }

    #[test]
    fn floating_version_always_pulls() {
        let engine = ImageStore::new(true, false);
        ensure_image(&engine, "rstudio/rstudio-connect", "jammy", "latest", None, true).unwrap();
        assert_eq!(engine.pulls.get(), 1);
        assert!(engine.inspected.borrow().is_empty());
    }

    #[test]
    fn pinned_uncached_image_is_pulled() {
        let engine = ImageStore::new(false, false);
        ensure_image(&engine, "img", "tag", "2025.09.0", None, true).unwrap();
        assert_eq!(engine.pulls.get(), 1);
    }

    #[test]
    fn failed_pull_falls_back_to_cache() {
        let engine = ImageStore::new(true, true);
        ensure_image(&engine, "img", "jammy", "release", None, true).unwrap();
        assert_eq!(engine.pulls.get(), 1);
    }

    #[test]
    fn failed_pull_without_cache_is_fatal() {
        let engine = ImageStore::new(false, true);
        let err = ensure_image(&engine, "img", "tag", "2025.09.0", None, true).unwrap_err();
        match err {
            SessionError::Acquisition { image, source } => {
                assert_eq!(image, "img:tag");
                assert!(source.to_string().contains("registry unreachable"));
            }
            other => panic!("expected acquisition error, got {other:?}"),
        }
    }
}
