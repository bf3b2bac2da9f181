use crate::channel::ChannelId;

pub const DEFAULT_TOPIC_BASE: &str = "home/room1";

/// Command, state and mode topics of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTopics {
    pub command: String,
    pub state: String,
    pub mode: String,
}

/// Every topic the controller uses, derived once from the topic base.
#[derive(Debug, Clone)]
pub struct TopicTable {
    channels: [ChannelTopics; 3],
    telemetry: String,
    availability: String,
}

impl TopicTable {
    pub fn new(base: &str) -> Self {
        let channels = ChannelId::ALL.map(|id| ChannelTopics {
            command: format!("{base}/{id}/cmd"),
            state: format!("{base}/{id}/state"),
            mode: format!("{base}/{id}/mode"),
        });

        Self {
            channels,
            telemetry: format!("{base}/telemetry"),
            availability: format!("{base}/status"),
        }
    }

    pub fn channel(&self, id: ChannelId) -> &ChannelTopics {
        &self.channels[id.index()]
    }

    /// Find the channel whose command topic is exactly `topic`.
    pub fn channel_for_command(&self, topic: &str) -> Option<ChannelId> {
        ChannelId::ALL
            .into_iter()
            .find(|id| self.channel(*id).command == topic)
    }

    pub fn command_topics(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|topics| topics.command.as_str())
    }

    pub fn telemetry(&self) -> &str {
        &self.telemetry
    }

    pub fn availability(&self) -> &str {
        &self.availability
    }
}
