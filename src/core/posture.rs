//! Posture classification from gyroscope moving averages.
//!
//! Two trigger windows are kept: one over `gyro.x` for forward/back lean and
//! one over `gyro.z` for left/right lean. Forward/back is checked first and
//! wins outright; when it fires, the left/right window is not fed that
//! sample, so the two windows drift out of lockstep under sustained
//! forward/back lean.

use crate::core::record::SensorRecord;
use crate::core::window::TriggerWindow;
use serde::{Deserialize, Serialize};

/// Gyro moving average beyond which a lean is reported.
pub const DEFAULT_GYRO_TRIGGER: i64 = 400;

/// Number of consecutive samples averaged per window.
pub const DEFAULT_TRIGGER_COUNT: usize = 3;

/// Discrete posture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureStatus {
    Steady,
    LeanLeft,
    LeanRight,
    LeanForward,
    LeanBack,
}

impl PostureStatus {
    /// All states in declaration order.
    pub const ALL: [PostureStatus; 5] = [
        PostureStatus::Steady,
        PostureStatus::LeanLeft,
        PostureStatus::LeanRight,
        PostureStatus::LeanForward,
        PostureStatus::LeanBack,
    ];

    /// Actuator code sent to the device for this state.
    ///
    /// Not the declaration order: Steady maps to 4 and the leans to 0..=3.
    pub fn command_code(self) -> u8 {
        match self {
            PostureStatus::LeanLeft => 0,
            PostureStatus::LeanForward => 1,
            PostureStatus::LeanRight => 2,
            PostureStatus::LeanBack => 3,
            PostureStatus::Steady => 4,
        }
    }

    /// Inverse of [`command_code`](Self::command_code).
    pub fn from_command_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(PostureStatus::LeanLeft),
            1 => Some(PostureStatus::LeanForward),
            2 => Some(PostureStatus::LeanRight),
            3 => Some(PostureStatus::LeanBack),
            4 => Some(PostureStatus::Steady),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PostureStatus::Steady => "steady",
            PostureStatus::LeanLeft => "left",
            PostureStatus::LeanRight => "right",
            PostureStatus::LeanForward => "forward",
            PostureStatus::LeanBack => "back",
        }
    }
}

impl std::fmt::Display for PostureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classifier thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Moving-average magnitude that counts as a lean
    pub gyro_trigger: i64,
    /// Samples per moving-average window
    pub trigger_count: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            gyro_trigger: DEFAULT_GYRO_TRIGGER,
            trigger_count: DEFAULT_TRIGGER_COUNT,
        }
    }
}

/// Moving-average posture classifier. One per session.
#[derive(Debug, Clone)]
pub struct PostureClassifier {
    gyro_trigger: i64,
    forward_back: TriggerWindow,
    left_right: TriggerWindow,
}

impl PostureClassifier {
    /// A negative trigger is treated as zero.
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            gyro_trigger: config.gyro_trigger.max(0),
            forward_back: TriggerWindow::new(config.trigger_count),
            left_right: TriggerWindow::new(config.trigger_count),
        }
    }

    /// Feed one record and return the resulting posture.
    pub fn classify(&mut self, record: &SensorRecord) -> PostureStatus {
        let avg = self.forward_back.push(record.gyro.x);
        if avg > self.gyro_trigger {
            return PostureStatus::LeanForward;
        }
        if avg < -self.gyro_trigger {
            return PostureStatus::LeanBack;
        }

        let avg = self.left_right.push(record.gyro.z);
        if avg > self.gyro_trigger {
            return PostureStatus::LeanLeft;
        }
        if avg < -self.gyro_trigger {
            return PostureStatus::LeanRight;
        }

        PostureStatus::Steady
    }

    /// Window over `gyro.x`.
    pub fn forward_back_window(&self) -> &TriggerWindow {
        &self.forward_back
    }

    /// Window over `gyro.z`.
    pub fn left_right_window(&self) -> &TriggerWindow {
        &self.left_right
    }

    pub fn reset(&mut self) {
        self.forward_back.clear();
        self.left_right.clear();
    }
}

impl Default for PostureClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Vector;

    fn gyro(x: i64, z: i64) -> SensorRecord {
        SensorRecord {
            gyro: Vector::new(x, 0, z),
            ..Default::default()
        }
    }

    #[test]
    fn test_forward_needs_full_window() {
        let mut classifier = PostureClassifier::default();
        assert_eq!(classifier.classify(&gyro(500, 0)), PostureStatus::Steady);
        assert_eq!(classifier.classify(&gyro(500, 0)), PostureStatus::Steady);
        assert_eq!(classifier.classify(&gyro(500, 0)), PostureStatus::LeanForward);
    }

    #[test]
    fn test_back_left_right() {
        let mut classifier = PostureClassifier::default();
        for _ in 0..3 {
            classifier.classify(&gyro(-600, 0));
        }
        assert_eq!(classifier.classify(&gyro(-600, 0)), PostureStatus::LeanBack);

        let mut classifier = PostureClassifier::default();
        let mut last = PostureStatus::Steady;
        for _ in 0..3 {
            last = classifier.classify(&gyro(0, 700));
        }
        assert_eq!(last, PostureStatus::LeanLeft);

        let mut classifier = PostureClassifier::default();
        for _ in 0..3 {
            last = classifier.classify(&gyro(0, -700));
        }
        assert_eq!(last, PostureStatus::LeanRight);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut classifier = PostureClassifier::default();
        for _ in 0..5 {
            assert_eq!(classifier.classify(&gyro(400, -400)), PostureStatus::Steady);
        }
        assert_eq!(classifier.classify(&gyro(401, 0)), PostureStatus::Steady);
    }

    #[test]
    fn test_forward_back_has_priority() {
        let mut classifier = PostureClassifier::default();
        let mut last = PostureStatus::Steady;
        for _ in 0..3 {
            last = classifier.classify(&gyro(900, 900));
        }
        assert_eq!(last, PostureStatus::LeanForward);
    }

    #[test]
    fn test_left_right_skipped_while_forward_fires() {
        let mut classifier = PostureClassifier::default();
        // First two calls do not trigger, so gyro.z is pushed twice
        classifier.classify(&gyro(600, 100));
        classifier.classify(&gyro(600, 100));
        assert_eq!(classifier.left_right_window().sum(), 200);

        // Forward fires from here on; left/right must not move
        for _ in 0..4 {
            assert_eq!(
                classifier.classify(&gyro(600, 5000)),
                PostureStatus::LeanForward
            );
        }
        assert_eq!(classifier.left_right_window().sum(), 200);
        assert_eq!(
            classifier.left_right_window().iter().collect::<Vec<_>>(),
            vec![0, 100, 100]
        );
    }

    #[test]
    fn test_configurable_thresholds() {
        let config = ClassifierConfig {
            gyro_trigger: 100,
            trigger_count: 1,
        };
        let mut classifier = PostureClassifier::new(&config);
        assert_eq!(classifier.classify(&gyro(0, -101)), PostureStatus::LeanRight);
        assert_eq!(classifier.classify(&gyro(0, 0)), PostureStatus::Steady);
    }

    #[test]
    fn test_command_code_mapping() {
        assert_eq!(PostureStatus::Steady.command_code(), 4);
        assert_eq!(PostureStatus::LeanLeft.command_code(), 0);
        for status in PostureStatus::ALL {
            assert_eq!(
                PostureStatus::from_command_code(status.command_code() as i64),
                Some(status)
            );
        }
        assert_eq!(PostureStatus::from_command_code(5), None);
        assert_eq!(PostureStatus::from_command_code(-1), None);
    }

    #[test]
    fn test_negative_trigger_clamped() {
        let mut classifier = PostureClassifier::new(&ClassifierConfig {
            gyro_trigger: i64::MIN,
            trigger_count: 1,
        });
        assert_eq!(classifier.classify(&gyro(1, 0)), PostureStatus::LeanForward);
        assert_eq!(classifier.classify(&gyro(-1, 0)), PostureStatus::LeanBack);
        assert_eq!(classifier.classify(&gyro(0, 0)), PostureStatus::Steady);
    }

    #[test]
    fn test_reset_clears_windows() {
        let mut classifier = PostureClassifier::default();
        classifier.classify(&gyro(300, 300));
        classifier.reset();
        assert_eq!(classifier.forward_back_window().sum(), 0);
        assert_eq!(classifier.left_right_window().sum(), 0);
    }
}
