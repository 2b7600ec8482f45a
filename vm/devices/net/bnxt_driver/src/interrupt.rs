// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Interrupt vector registration.

use crate::error::Error;

/// What a vector services.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterruptClass {
    /// The default completion ring.
    Admin,
    /// A receive completion ring.
    Rx,
    /// A soft context for transmit completions. Transmit completion rings
    /// are polled, so this has no hardware vector of its own.
    TxSoft,
}

/// A request to attach a handler to a vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptRequest {
    /// The MSI-X vector (resource id).
    pub vector: u32,
    /// What the vector services.
    pub class: InterruptClass,
    /// The queue set index, zero for the admin vector.
    pub queue: u16,
    /// Whether the handler defers work to a thread.
    pub deferred: bool,
    /// A name for diagnostics.
    pub name: &'static str,
}

/// A registered interrupt. Dropping it releases the registration.
pub trait InterruptRegistration: Send + Sync {
    /// The vector this registration is attached to.
    fn vector(&self) -> u32;
}

/// The host's interrupt subsystem.
pub trait InterruptRegistrar {
    /// Attaches a handler to a vector.
    fn register(
        &mut self,
        request: &InterruptRequest,
    ) -> anyhow::Result<Box<dyn InterruptRegistration>>;
}

/// Which completion ring raised an interrupt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterruptSource {
    /// The default completion ring.
    Admin,
    /// The completion ring of receive queue set `n`.
    Rx(u16),
}

/// What the interrupt filter asks of the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterResult {
    /// Nothing more to do.
    Handled,
    /// Run the deferred handler for the ring.
    ScheduleThread,
}

/// The vectors for a device with `nrx` receive and `ntx` transmit queue
/// sets, in registration order.
pub(crate) fn vector_requests(default_ring_id: u16, rx_ring_ids: &[u16], ntx: u16) -> Vec<InterruptRequest> {
    let mut requests = Vec::with_capacity(1 + rx_ring_ids.len() + usize::from(ntx));
    requests.push(InterruptRequest {
        vector: u32::from(default_ring_id) + 1,
        class: InterruptClass::Admin,
        queue: 0,
        deferred: false,
        name: "def_cp",
    });
    for (i, &id) in rx_ring_ids.iter().enumerate() {
        requests.push(InterruptRequest {
            vector: u32::from(id) + 1,
            class: InterruptClass::Rx,
            queue: i as u16,
            deferred: true,
            name: "rx_cp",
        });
    }
    for i in 0..ntx {
        requests.push(InterruptRequest {
            vector: u32::from(i) + 1,
            class: InterruptClass::TxSoft,
            queue: i,
            deferred: true,
            name: "tx_cp",
        });
    }
    requests
}

/// Registers every request in order. On failure, the registrations made so
/// far are released newest first.
pub(crate) fn register_all(
    registrar: &mut dyn InterruptRegistrar,
    requests: &[InterruptRequest],
) -> Result<Vec<Box<dyn InterruptRegistration>>, Error> {
    let mut registered = Vec::with_capacity(requests.len());
    for request in requests {
        match registrar.register(request) {
            Ok(r) => registered.push(r),
            Err(err) => {
                tracing::error!(
                    vector = request.vector,
                    class = ?request.class,
                    queue = request.queue,
                    error = err.as_ref() as &dyn std::error::Error,
                    "failed to register interrupt"
                );
                release_all(&mut registered);
                return Err(Error::Interrupt(err));
            }
        }
    }
    Ok(registered)
}

/// Releases registrations newest first.
pub(crate) fn release_all(registered: &mut Vec<Box<dyn InterruptRegistration>>) {
    while let Some(r) = registered.pop() {
        tracing::trace!(vector = r.vector(), "releasing interrupt");
        drop(r);
    }
}
