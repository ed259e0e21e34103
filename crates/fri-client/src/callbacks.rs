use fri_message::{CommandMessage, MonitoringMessage, SessionState};

use crate::error::CallbackError;

/// Application hooks invoked by the dispatcher, in this order per cycle:
/// state change (only on an actual transition), monitor, command.
///
/// Returning `Err` from any hook is logged and turns the cycle's reply into
/// a heartbeat. It never reaches the session state or the codec.
pub trait ClientCallbacks {
    /// The controller changed the session state. Called before the new
    /// state is committed.
    fn on_state_change(
        &mut self,
        old: SessionState,
        new: SessionState,
    ) -> Result<(), CallbackError> {
        let _ = (old, new);
        Ok(())
    }

    /// A monitoring or commanding cycle was decoded.
    fn on_monitor(&mut self, message: &MonitoringMessage) -> Result<(), CallbackError> {
        let _ = message;
        Ok(())
    }

    /// Fill `command` for a `COMMANDING_ACTIVE` cycle. `command` arrives
    /// reset; leaving it untouched sends a heartbeat.
    fn on_command(
        &mut self,
        message: &MonitoringMessage,
        command: &mut CommandMessage,
    ) -> Result<(), CallbackError>;
}

impl<C: ClientCallbacks + ?Sized> ClientCallbacks for &mut C {
    fn on_state_change(
        &mut self,
        old: SessionState,
        new: SessionState,
    ) -> Result<(), CallbackError> {
        (**self).on_state_change(old, new)
    }

    fn on_monitor(&mut self, message: &MonitoringMessage) -> Result<(), CallbackError> {
        (**self).on_monitor(message)
    }

    fn on_command(
        &mut self,
        message: &MonitoringMessage,
        command: &mut CommandMessage,
    ) -> Result<(), CallbackError> {
        (**self).on_command(message, command)
    }
}
