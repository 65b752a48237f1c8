//! eBay marketplace client: collaborator contracts and a REST
//! implementation.
//!
//! The pipeline depends only on the [`ItemClient`] and [`OrderClient`]
//! traits; [`rest::EbayApi`] is the production implementation. Errors
//! carry the classification the retry and compensation logic needs
//! (retryable vs. terminal, offer-layer vs. other).

pub mod error;
pub mod inventory;
pub mod orders;
pub mod rest;

pub use error::EbayError;
pub use inventory::{InventoryItem, ItemClient, OfferRequest};
pub use orders::{OrderClient, OrderDetails};
