//! Room Registry.
//!
//! Maps room codes to rooms, creating a room with a fresh puzzle on first
//! reference. Rooms are kept for the life of the process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use collabadoku_core::{CollabError, Grid, PuzzleGenerator};

use crate::room::Room;

pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    generator: Arc<dyn PuzzleGenerator>,
}

impl RoomRegistry {
    pub fn new(generator: Arc<dyn PuzzleGenerator>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            generator,
        }
    }

    /// Returns the room for `code`, creating it if unseen.
    ///
    /// Creation happens under the registry lock, so racing callers for the
    /// same new code all get the one room. The flag is `true` for the
    /// caller that created it.
    pub async fn get_or_create(&self, code: &str) -> Result<(Arc<Room>, bool), CollabError> {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(code) {
            return Ok((Arc::clone(room), false));
        }

        let puzzle = self.generator.generate();
        let grid = Grid::initialize(&puzzle).inspect_err(|e| {
            warn!(room_code = %code, error = %e, "Puzzle generator returned an invalid grid");
        })?;

        let room = Arc::new(Room::new(code, grid));
        rooms.insert(code.to_string(), Arc::clone(&room));
        info!(room_code = %code, rooms = rooms.len(), "Created room");
        Ok((room, true))
    }

    /// Looks up an existing room without creating one.
    pub async fn get(&self, code: &str) -> Option<Arc<Room>> {
        self.rooms.lock().await.get(code).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PUZZLE: &str =
        "53--7----6--195----98----6-8---6---34--8-3--17---2---6-6----28----419--5----8--79";

    struct CountingGenerator {
        puzzle: &'static str,
        calls: AtomicUsize,
    }

    impl PuzzleGenerator for CountingGenerator {
        fn generate(&self) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.puzzle.to_string()
        }
    }

    fn registry(puzzle: &'static str) -> (RoomRegistry, Arc<CountingGenerator>) {
        let generator = Arc::new(CountingGenerator {
            puzzle,
            calls: AtomicUsize::new(0),
        });
        (RoomRegistry::new(generator.clone()), generator)
    }

    #[tokio::test]
    async fn second_reference_returns_same_room() {
        let (registry, generator) = registry(PUZZLE);
        let (first, created) = registry.get_or_create("abc").await.unwrap();
        assert!(created);
        let (second, created) = registry.get_or_create("abc").await.unwrap();
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn distinct_codes_get_distinct_rooms() {
        let (registry, _) = registry(PUZZLE);
        let (a, _) = registry.get_or_create("a").await.unwrap();
        let (b, _) = registry.get_or_create("b").await.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.code(), "a");
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_references_create_one_room() {
        let (registry, generator) = registry(PUZZLE);
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.get_or_create("race").await.unwrap() })
            })
            .collect();

        let mut rooms = Vec::new();
        for handle in handles {
            rooms.push(handle.await.unwrap());
        }

        assert_eq!(rooms.iter().filter(|(_, created)| *created).count(), 1);
        assert!(rooms.iter().all(|(room, _)| Arc::ptr_eq(room, &rooms[0].0)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_puzzle_creates_nothing() {
        let (registry, _) = registry("123");
        let err = registry.get_or_create("bad").await.unwrap_err();
        assert!(matches!(err, CollabError::MalformedPuzzle(_)));
        assert!(registry.is_empty().await);
        assert!(registry.get("bad").await.is_none());
    }
}
