//! Touch session tracking for a single active finger

use glam::Vec2;

/// One touch from start to end
///
/// `origin` is the ring center the move vector is measured from;
/// `last_location` is the most recent processed touch point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TouchSession {
    pub origin: Vec2,
    pub last_location: Vec2,
    pub active: bool,
}

impl TouchSession {
    pub fn begin(&mut self, origin: Vec2, location: Vec2) {
        *self = Self {
            origin,
            last_location: location,
            active: true,
        };
    }

    /// True if `location` differs from the last recorded point
    pub fn has_moved(&self, location: Vec2) -> bool {
        self.last_location != location
    }

    pub fn record(&mut self, location: Vec2) {
        self.last_location = location;
    }

    pub fn end(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut session = TouchSession::default();
        assert!(!session.active);

        session.begin(Vec2::new(10.0, 10.0), Vec2::new(12.0, 9.0));
        assert!(session.active);
        assert_eq!(session.origin, Vec2::new(10.0, 10.0));

        assert!(!session.has_moved(Vec2::new(12.0, 9.0)));
        assert!(session.has_moved(Vec2::new(12.0, 9.5)));

        session.record(Vec2::new(12.0, 9.5));
        assert!(!session.has_moved(Vec2::new(12.0, 9.5)));

        session.end();
        assert_eq!(session, TouchSession::default());
    }
}
