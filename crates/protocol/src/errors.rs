//! Classification of peer errors by D-Bus error name.
//!
//! Peers routinely vanish mid-call (shutdown, restart, replaced items), so
//! a handful of error names are expected traffic rather than faults. Callers
//! log these at debug level and abandon the operation.

use zbus::fdo;

/// Errors that occur when the remote peer is gone or mid-shutdown.
///
/// These must never propagate past the completion handler that observes
/// them; the peer will either come back with a fresh registration or be
/// swept by the liveness monitor.
pub fn is_transient_peer_error(err: &zbus::Error) -> bool {
    match err {
        zbus::Error::FDO(fdo) => matches!(
            **fdo,
            fdo::Error::UnknownObject(_)
                | fdo::Error::ServiceUnknown(_)
                | fdo::Error::NoReply(_)
                | fdo::Error::NameHasNoOwner(_)
                | fdo::Error::UnknownProperty(_)
        ),
        zbus::Error::MethodError(name, _, _) => matches!(
            name.as_str(),
            "org.freedesktop.DBus.Error.UnknownObject"
                | "org.freedesktop.DBus.Error.ServiceUnknown"
                | "org.freedesktop.DBus.Error.NoReply"
                | "org.freedesktop.DBus.Error.NameHasNoOwner"
        ),
        _ => false,
    }
}

/// Errors meaning the peer does not implement the called method.
///
/// `AboutToShow` is optional; peers without it answer with one of these and
/// the call is treated as having succeeded.
pub fn is_unknown_method_error(err: &zbus::Error) -> bool {
    match err {
        zbus::Error::FDO(fdo) => matches!(
            **fdo,
            fdo::Error::UnknownMethod(_)
                | fdo::Error::UnknownInterface(_)
                | fdo::Error::NotSupported(_)
        ),
        zbus::Error::MethodError(name, _, _) => matches!(
            name.as_str(),
            "org.freedesktop.DBus.Error.UnknownMethod"
                | "org.freedesktop.DBus.Error.UnknownInterface"
                | "org.freedesktop.DBus.Error.NotSupported"
        ),
        _ => false,
    }
}
