pub mod client;

/// Outbound half of the broker connection as the controller sees it.
///
/// Calls must not block: the controller runs inside the same loop that drives
/// the network, so implementations queue and return.
pub trait Transport {
    type Error: std::fmt::Display;

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    fn publish(&mut self, message: Outbound<'_>) -> Result<(), Self::Error>;
}

/// A message leaving the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outbound<'a> {
    pub topic: &'a str,
    pub payload: &'a str,
    pub retain: bool,
}
