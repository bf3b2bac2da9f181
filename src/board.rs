use std::collections::BTreeMap;

use tracing::info;

use crate::channel::{ChannelId, Power};

/// Sensor name → value, as reported in telemetry.
pub type Readings = BTreeMap<String, f64>;

/// Hardware seam: the relays behind each channel and any attached sensors.
pub trait Board {
    fn set_output(&mut self, channel: ChannelId, power: Power);

    fn readings(&mut self) -> Readings;
}

/// In-memory board for running off-device. Outputs are logged, no sensors.
#[derive(Debug, Default)]
pub struct SimulatedBoard {
    outputs: [Power; 3],
}

impl SimulatedBoard {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn output(&self, channel: ChannelId) -> Power {
        self.outputs[channel.index()]
    }
}

impl Board for SimulatedBoard {
    fn set_output(&mut self, channel: ChannelId, power: Power) {
        let slot = &mut self.outputs[channel.index()];
        if *slot != power {
            info!("Output {} -> {}", channel, power);
            *slot = power;
        }
    }

    fn readings(&mut self) -> Readings {
        Readings::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_outputs_per_channel() {
        let mut board = SimulatedBoard::new();
        board.set_output(ChannelId::Fan, Power::On);

        assert_eq!(board.output(ChannelId::Fan), Power::On);
        assert_eq!(board.output(ChannelId::Light), Power::Off);
        assert_eq!(board.output(ChannelId::Alarm), Power::Off);
        assert!(board.readings().is_empty());
    }
}
