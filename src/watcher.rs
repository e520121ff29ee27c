use std::path::Path;
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::Result;
use crate::filter::PathFilter;
use crate::trigger::Trigger;

/// Start watching `root` recursively on notify's own thread.
///
/// Relevant changes arm `trigger`; all timing decisions are left to the
/// main loop. Dropping the returned handle stops watching.
pub fn spawn(root: &Path, filter: PathFilter, trigger: Arc<Trigger>) -> Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => handle_event(&event, &filter, &trigger),
        // Transient errors leave the watch in place.
        Err(err) => tracing::warn!(error = %err, "file watcher error"),
    })?;

    watcher.watch(root, RecursiveMode::Recursive)?;
    tracing::debug!(root = %root.display(), "watching");

    Ok(watcher)
}

/// Arm the trigger if `event` touches a path the filter accepts.
fn handle_event(event: &Event, filter: &PathFilter, trigger: &Trigger) {
    if !is_change(&event.kind) {
        return;
    }

    if let Some(path) = event.paths.iter().find(|path| filter.matches(path)) {
        if trigger.is_empty() {
            tracing::debug!(path = %path.display(), kind = ?event.kind, "change detected");
        }
        trigger.emit();
    }
}

/// Creations, modifications (renames included) and removals count as changes.
fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind, RenameMode};
    use std::path::PathBuf;

    fn py_filter() -> PathFilter {
        PathFilter::new(
            Path::new("/project"),
            &["*.py".to_string()],
            &["ignored.py".to_string()],
        )
        .unwrap()
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn matching_change_arms_trigger() {
        let trigger = Trigger::new();
        handle_event(
            &event(EventKind::Modify(ModifyKind::Any), "/project/app.py"),
            &py_filter(),
            &trigger,
        );
        assert!(!trigger.is_empty());
    }

    #[test]
    fn create_remove_and_rename_count() {
        let filter = py_filter();
        for kind in [
            EventKind::Create(CreateKind::File),
            EventKind::Remove(RemoveKind::File),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
        ] {
            let trigger = Trigger::new();
            handle_event(&event(kind, "/project/app.py"), &filter, &trigger);
            assert!(!trigger.is_empty(), "{kind:?} should arm the trigger");
        }
    }

    #[test]
    fn access_events_are_dropped() {
        let trigger = Trigger::new();
        handle_event(
            &event(EventKind::Access(AccessKind::Any), "/project/app.py"),
            &py_filter(),
            &trigger,
        );
        assert!(trigger.is_empty());
    }

    #[test]
    fn non_matching_and_excluded_paths_are_dropped() {
        let filter = py_filter();
        let trigger = Trigger::new();

        handle_event(
            &event(EventKind::Modify(ModifyKind::Any), "/project/notes.txt"),
            &filter,
            &trigger,
        );
        handle_event(
            &event(EventKind::Modify(ModifyKind::Any), "/project/ignored.py"),
            &filter,
            &trigger,
        );

        assert!(trigger.is_empty());
    }

    #[test]
    fn rename_into_watched_name_counts() {
        let trigger = Trigger::new();
        let rename = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/project/draft.tmp"))
            .add_path(PathBuf::from("/project/final.py"));

        handle_event(&rename, &py_filter(), &trigger);

        assert!(!trigger.is_empty());
    }

    #[test]
    fn missing_root_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("missing");
        let filter = PathFilter::new(&root, &["*.py".to_string()], &[]).unwrap();

        let result = spawn(&root, filter, Arc::new(Trigger::new()));

        assert!(result.is_err());
    }
}
