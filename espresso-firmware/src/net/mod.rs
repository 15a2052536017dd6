// Netzwerk-Module: WLAN-Link und Broker-Client
//
// Beide implementieren die espresso-core Traits (Link, Broker, Session) und
// werden exklusiv von der Schleife besessen.

pub mod broker;
pub mod wifi;

pub use broker::{SessionBuffers, TbBroker, TbSession};
pub use wifi::{WifiLink, net_task};
