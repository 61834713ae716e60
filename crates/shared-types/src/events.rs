//! # Wire Event Names
//!
//! Every RPC between the proxy and the connector server is named by one of
//! these events. The server pushes chaincode events under [`EVENTS`].

use std::fmt;
use std::str::FromStr;

/// Name of the server push carrying `[connectionId, events[]]`.
pub const EVENTS: &str = "events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiEvent {
    ConnectionManagerConnect,
    ConnectionManagerImportIdentity,
    ConnectionManagerRemoveIdentity,
    ConnectionManagerExportIdentity,
    ConnectionDisconnect,
    ConnectionLogin,
    ConnectionInstall,
    ConnectionStart,
    ConnectionUpgrade,
    ConnectionPing,
    ConnectionQueryChainCode,
    ConnectionInvokeChainCode,
    ConnectionCreateIdentity,
    ConnectionList,
    ConnectionCreateTransactionId,
    ConnectionProfileStoreLoad,
    ConnectionProfileStoreSave,
    ConnectionProfileStoreLoadAll,
    ConnectionProfileStoreDelete,
    BusinessNetworkCardStoreGet,
    BusinessNetworkCardStoreHas,
    BusinessNetworkCardStorePut,
    BusinessNetworkCardStoreGetAll,
    BusinessNetworkCardStoreDelete,
}

impl ApiEvent {
    pub const ALL: [ApiEvent; 24] = [
        ApiEvent::ConnectionManagerConnect,
        ApiEvent::ConnectionManagerImportIdentity,
        ApiEvent::ConnectionManagerRemoveIdentity,
        ApiEvent::ConnectionManagerExportIdentity,
        ApiEvent::ConnectionDisconnect,
        ApiEvent::ConnectionLogin,
        ApiEvent::ConnectionInstall,
        ApiEvent::ConnectionStart,
        ApiEvent::ConnectionUpgrade,
        ApiEvent::ConnectionPing,
        ApiEvent::ConnectionQueryChainCode,
        ApiEvent::ConnectionInvokeChainCode,
        ApiEvent::ConnectionCreateIdentity,
        ApiEvent::ConnectionList,
        ApiEvent::ConnectionCreateTransactionId,
        ApiEvent::ConnectionProfileStoreLoad,
        ApiEvent::ConnectionProfileStoreSave,
        ApiEvent::ConnectionProfileStoreLoadAll,
        ApiEvent::ConnectionProfileStoreDelete,
        ApiEvent::BusinessNetworkCardStoreGet,
        ApiEvent::BusinessNetworkCardStoreHas,
        ApiEvent::BusinessNetworkCardStorePut,
        ApiEvent::BusinessNetworkCardStoreGetAll,
        ApiEvent::BusinessNetworkCardStoreDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionManagerConnect => "/api/connectionManagerConnect",
            Self::ConnectionManagerImportIdentity => "/api/connectionManagerImportIdentity",
            Self::ConnectionManagerRemoveIdentity => "/api/connectionManagerRemoveIdentity",
            Self::ConnectionManagerExportIdentity => "/api/connectionManagerExportIdentity",
            Self::ConnectionDisconnect => "/api/connectionDisconnect",
            Self::ConnectionLogin => "/api/connectionLogin",
            Self::ConnectionInstall => "/api/connectionInstall",
            Self::ConnectionStart => "/api/connectionStart",
            Self::ConnectionUpgrade => "/api/connectionUpgrade",
            Self::ConnectionPing => "/api/connectionPing",
            Self::ConnectionQueryChainCode => "/api/connectionQueryChainCode",
            Self::ConnectionInvokeChainCode => "/api/connectionInvokeChainCode",
            Self::ConnectionCreateIdentity => "/api/connectionCreateIdentity",
            Self::ConnectionList => "/api/connectionList",
            Self::ConnectionCreateTransactionId => "/api/connectionCreateTransactionId",
            Self::ConnectionProfileStoreLoad => "/api/connectionProfileStoreLoad",
            Self::ConnectionProfileStoreSave => "/api/connectionProfileStoreSave",
            Self::ConnectionProfileStoreLoadAll => "/api/connectionProfileStoreLoadAll",
            Self::ConnectionProfileStoreDelete => "/api/connectionProfileStoreDelete",
            Self::BusinessNetworkCardStoreGet => "/api/businessNetworkCardStoreGet",
            Self::BusinessNetworkCardStoreHas => "/api/businessNetworkCardStoreHas",
            Self::BusinessNetworkCardStorePut => "/api/businessNetworkCardStorePut",
            Self::BusinessNetworkCardStoreGetAll => "/api/businessNetworkCardStoreGetAll",
            Self::BusinessNetworkCardStoreDelete => "/api/businessNetworkCardStoreDelete",
        }
    }
}

impl fmt::Display for ApiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| format!("Unknown event: {s}"))
    }
}
