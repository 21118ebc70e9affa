//! The visitor cart and its metadata bookkeeping.
//!
//! A cart line names a product, a quantity and three file references
//! (Emirates ID, trade license, optional design). The references point into
//! a separate blob store by key, so the cart itself stays small JSON.
//!
//! Stored cart JSON is never trusted: [`Cart::restore`] decodes each line on
//! its own and purges anything that is malformed or lost a mandatory file
//! key. Saving goes through [`fit_to_ceiling`], which sheds older lines
//! rather than failing when the metadata outgrows its size ceiling.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Price;
use crate::upload::UploadSlot;

/// Largest quantity a single line accepts.
pub const MAX_QUANTITY: u32 = 10_000;

/// Reference to an uploaded file held in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Blob store key.
    pub key: String,
    /// File name as uploaded.
    pub file_name: String,
    /// Content type reported or inferred at upload time.
    pub content_type: String,
    /// Size in bytes at upload time.
    pub size: u64,
}

impl FileRef {
    fn is_intact(&self) -> bool {
        !self.key.trim().is_empty()
    }
}

/// One pending order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub product_slug: String,
    pub product_name: String,
    #[serde(default)]
    pub unit_price: Option<Price>,
    pub quantity: u32,
    pub emirates_id: FileRef,
    pub trade_license: FileRef,
    #[serde(default)]
    pub design: Option<FileRef>,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Whether the line still satisfies the cart invariants.
    #[must_use]
    pub fn is_intact(&self) -> bool {
        self.quantity > 0
            && self.quantity <= MAX_QUANTITY
            && self.emirates_id.is_intact()
            && self.trade_license.is_intact()
            && self.design.as_ref().is_none_or(FileRef::is_intact)
    }

    /// The file reference held in `slot`, if any.
    #[must_use]
    pub fn file(&self, slot: UploadSlot) -> Option<&FileRef> {
        match slot {
            UploadSlot::EmiratesId => Some(&self.emirates_id),
            UploadSlot::TradeLicense => Some(&self.trade_license),
            UploadSlot::Design => self.design.as_ref(),
            UploadSlot::QuoteAttachment => None,
        }
    }

    /// All file references on this line with their slots.
    pub fn files(&self) -> impl Iterator<Item = (UploadSlot, &FileRef)> {
        UploadSlot::CART_SLOTS
            .into_iter()
            .filter_map(|slot| self.file(slot).map(|file| (slot, file)))
    }

    /// Line total when the product has a list price.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.unit_price.map(|price| price.times(self.quantity))
    }
}

/// The visitor's cart, oldest line first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

/// Result of loading stored cart JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    /// Lines that survived.
    pub cart: Cart,
    /// Number of stored lines that were dropped.
    pub purged: usize,
    /// The stored cart was unusable as a whole and has been emptied.
    pub cleared: bool,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Rebuild a cart from stored JSON, purging corrupt lines.
    ///
    /// `null` means nothing was stored. Any other non-array value, or an
    /// array whose every line is corrupt, yields an empty cart flagged as
    /// cleared.
    #[must_use]
    pub fn restore(raw: serde_json::Value) -> Restored {
        let values = match raw {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::Array(values) => values,
            _ => {
                return Restored {
                    cart: Self::new(),
                    purged: 0,
                    cleared: true,
                };
            }
        };

        let stored = values.len();
        let mut items: Vec<CartItem> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value::<CartItem>(value).ok())
            .filter(CartItem::is_intact)
            .collect();
        items.sort_by_key(|item| item.added_at);

        let purged = stored - items.len();
        Restored {
            cleared: stored > 0 && items.is_empty(),
            cart: Self { items },
            purged,
        }
    }

    /// Lines, oldest first.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of priced lines. Lines without a list price are quoted separately.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        let amount = self
            .items
            .iter()
            .filter_map(CartItem::line_total)
            .map(|price| price.amount)
            .sum::<Decimal>();
        Price::aed(amount)
    }

    /// Find a line by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Append a line.
    pub fn add(&mut self, item: CartItem) {
        self.items.push(item);
    }

    /// Change a line's quantity. Zero removes the line, which is returned.
    ///
    /// Returns `None` when no line has `id`.
    pub fn set_quantity(&mut self, id: Uuid, quantity: u32) -> Option<QuantityChange> {
        if quantity == 0 {
            return self.remove(id).map(QuantityChange::Removed);
        }
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        item.quantity = quantity.min(MAX_QUANTITY);
        Some(QuantityChange::Updated)
    }

    /// Remove a line, returning it so its blobs can be released.
    pub fn remove(&mut self, id: Uuid) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Every blob key referenced by the cart.
    #[must_use]
    pub fn blob_keys(&self) -> Vec<String> {
        self.items
            .iter()
            .flat_map(|item| item.files().map(|(_, file)| file.key.clone()))
            .collect()
    }

    /// Size of the cart as stored JSON.
    #[must_use]
    pub fn stored_size(&self) -> usize {
        serde_json::to_vec(&self.items).map_or(usize::MAX, |bytes| bytes.len())
    }
}

/// What `set_quantity` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityChange {
    Updated,
    Removed(CartItem),
}

/// How a save had to shrink the cart to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    /// Saved as is.
    Stored,
    /// The oldest lines were dropped.
    DroppedOlder { dropped: usize },
    /// Only the newest line was kept.
    KeptNewest { dropped: usize },
    /// Nothing could be kept.
    Wiped { dropped: usize },
}

impl FitOutcome {
    /// Whether lines were lost.
    #[must_use]
    pub const fn is_lossy(self) -> bool {
        !matches!(self, Self::Stored)
    }

    /// Message for the visitor when lines were lost.
    #[must_use]
    pub fn notice(self) -> Option<String> {
        match self {
            Self::Stored => None,
            Self::DroppedOlder { dropped } => Some(format!(
                "Your cart was too large to save, so the {dropped} oldest item(s) were removed."
            )),
            Self::KeptNewest { .. } => Some(
                "Your cart was too large to save, so only the most recent item was kept."
                    .to_string(),
            ),
            Self::Wiped { .. } => Some(
                "Your cart could not be saved and has been cleared. Please add your items again."
                    .to_string(),
            ),
        }
    }
}

/// A cart shrunk to fit its ceiling, plus the lines that did not make it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fitted {
    pub cart: Cart,
    pub outcome: FitOutcome,
    pub evicted: Vec<CartItem>,
}

/// Shrink `cart` until its stored JSON is at most `ceiling` bytes.
///
/// Tries, in order: the cart as is; the newer half of its lines; the newest
/// line alone; nothing.
#[must_use]
pub fn fit_to_ceiling(cart: Cart, ceiling: usize) -> Fitted {
    if cart.stored_size() <= ceiling {
        return Fitted {
            cart,
            outcome: FitOutcome::Stored,
            evicted: Vec::new(),
        };
    }

    let mut items = cart.items;
    items.sort_by_key(|item| item.added_at);
    let total = items.len();

    if total > 2 {
        let keep_from = total / 2;
        let newer = Cart {
            items: items.get(keep_from..).unwrap_or_default().to_vec(),
        };
        if newer.stored_size() <= ceiling {
            let evicted = items.drain(..keep_from).collect::<Vec<_>>();
            return Fitted {
                cart: newer,
                outcome: FitOutcome::DroppedOlder {
                    dropped: evicted.len(),
                },
                evicted,
            };
        }
    }

    if let Some(newest) = items.pop() {
        let single = Cart {
            items: vec![newest],
        };
        if single.stored_size() <= ceiling {
            return Fitted {
                cart: single,
                outcome: FitOutcome::KeptNewest {
                    dropped: items.len(),
                },
                evicted: items,
            };
        }
        items.extend(single.items);
    }

    Fitted {
        cart: Cart::new(),
        outcome: FitOutcome::Wiped { dropped: total },
        evicted: items,
    }
}
