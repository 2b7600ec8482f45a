// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A driver core for Broadcom NetXtreme-C/E (bnxt) network adapters.
//!
//! The driver allocates the transmit, receive, aggregation and completion
//! rings of every queue set, binds them to firmware handles through the HWRM
//! command channel, services completion interrupts, and keeps the receive
//! filter and link state in sync with firmware.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backoff;
pub mod backing;
pub mod bnxt;
pub mod config;
mod error;
pub mod filter;
mod hwrm;
pub mod ifdi;
pub mod interrupt;
mod l2_driver;
pub mod link;
pub mod memory;
pub mod queues;
mod resources;
pub mod rings;
mod store_fence;

#[cfg(test)]
mod emulated;

pub use bnxt::BnxtDevice;
pub use bnxt::DeviceState;
pub use config::BnxtConfig;
pub use error::Error;
pub use hwrm::FirmwareInfo;
