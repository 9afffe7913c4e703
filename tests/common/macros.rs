/// Asserts that the actor with the given id is at `(x, y)`.
#[macro_export]
macro_rules! assert_actor_at {
    ($engine:expr, $id:expr, $x:expr, $y:expr) => {
        let actor = $engine.actor(&$id).expect("Actor not found in grid");
        assert_eq!(
            actor.position(),
            ($x, $y),
            "Actor {} is not at ({}, {})",
            $id,
            $x,
            $y
        );
    };
}

/// Asserts that the actor with the given id is gone.
#[macro_export]
macro_rules! assert_actor_gone {
    ($engine:expr, $id:expr) => {
        assert!(
            $engine.actor(&$id).is_none(),
            "Actor {} should be gone but was found",
            $id
        );
    };
}

/// Asserts the live count of one actor kind.
#[macro_export]
macro_rules! assert_count {
    ($engine:expr, $kind:expr, $count:expr) => {
        assert_eq!(
            $engine.grid().count($kind),
            $count,
            "{:?} count mismatch",
            $kind
        );
    };
}

/// Asserts that some event message contains `needle`.
#[macro_export]
macro_rules! assert_event {
    ($events:expr, $needle:expr) => {
        assert!(
            $events.iter().any(|e| e.message.contains($needle)),
            "No event containing {:?}",
            $needle
        );
    };
}
