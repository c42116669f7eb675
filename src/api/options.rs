use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct ReplicatedLogOptions {
    /// Ticks without leader contact before the core starts an election.
    pub election_timeout_ticks: Option<u32>,
    /// Ticks between leader heartbeats.
    pub heartbeat_interval_ticks: Option<u32>,
    /// Wall-clock duration of one tick.
    pub tick_interval: Option<Duration>,
    /// Upper bound on how long a write handle waits for commit.
    pub write_timeout: Option<Duration>,
}

pub(super) struct ReplicatedLogOptionsValidated {
    pub election_timeout_ticks: u32,
    pub heartbeat_interval_ticks: u32,
    pub tick_interval: Duration,
    pub write_timeout: Duration,
}

impl ReplicatedLogOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.heartbeat_interval_ticks == 0 {
            return Err("Heartbeat interval must be at least one tick");
        }
        if self.election_timeout_ticks <= self.heartbeat_interval_ticks {
            return Err("Election timeout must be greater than the heartbeat interval");
        }
        if self.tick_interval.is_zero() {
            return Err("Tick interval must be non-zero");
        }
        if self.write_timeout.is_zero() {
            return Err("Write timeout must be non-zero");
        }

        Ok(())
    }
}

impl TryFrom<ReplicatedLogOptions> for ReplicatedLogOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ReplicatedLogOptions) -> Result<Self, Self::Error> {
        let values = ReplicatedLogOptionsValidated {
            election_timeout_ticks: options.election_timeout_ticks.unwrap_or(10),
            heartbeat_interval_ticks: options.heartbeat_interval_ticks.unwrap_or(1),
            tick_interval: options.tick_interval.unwrap_or(Duration::from_millis(100)),
            write_timeout: options.write_timeout.unwrap_or(Duration::from_secs(10)),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ReplicatedLogOptionsValidated::try_from(ReplicatedLogOptions::default()).is_ok());
    }

    #[test]
    fn election_timeout_must_exceed_heartbeat() {
        let options = ReplicatedLogOptions {
            election_timeout_ticks: Some(2),
            heartbeat_interval_ticks: Some(2),
            ..ReplicatedLogOptions::default()
        };
        assert!(ReplicatedLogOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn zero_write_timeout_is_rejected() {
        let options = ReplicatedLogOptions {
            write_timeout: Some(Duration::from_secs(0)),
            ..ReplicatedLogOptions::default()
        };
        assert!(ReplicatedLogOptionsValidated::try_from(options).is_err());
    }
}
