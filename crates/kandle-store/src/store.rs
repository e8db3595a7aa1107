//! Per-symbol base candle storage.

use std::collections::{BTreeMap, BTreeSet, HashMap, btree_map};
use std::ops::Bound;
use std::sync::Arc;

use kandle_types::{Candle, CandleSeries, KandleError, Result, Symbol, Timeframe, Timestamp};
use parking_lot::RwLock;
use tracing::debug;

type CandleMap = BTreeMap<Timestamp, Candle>;

/// What an [`CandleStore::append`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppendOutcome {
    /// A new timestamp was added.
    Inserted,
    /// A provisional candle was overwritten.
    Replaced,
    /// The candle was already stored with the same values.
    Unchanged,
}

impl AppendOutcome {
    /// Returns true if stored history changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Candle history of a single symbol.
#[derive(Debug, Default)]
struct SymbolBook {
    /// Shared with outstanding [`CandleRange`] snapshots; cloned on write
    /// only while a snapshot is alive.
    candles: Arc<CandleMap>,
    /// Timestamps whose candle is still provisional.
    provisional: BTreeSet<Timestamp>,
    /// Most recent finalized timestamp.
    last_finalized: Option<Timestamp>,
}

impl SymbolBook {
    fn append(&mut self, symbol: &Symbol, candle: Candle) -> Result<AppendOutcome> {
        let timestamp = candle.timestamp;
        let outcome = match self.candles.get(&timestamp) {
            None => AppendOutcome::Inserted,
            Some(existing) if existing.is_finalized() => {
                if existing.same_values(&candle) {
                    return Ok(AppendOutcome::Unchanged);
                }
                return Err(KandleError::ImmutableCandleConflict {
                    symbol: symbol.clone(),
                    timestamp,
                });
            }
            Some(existing) if *existing == candle => return Ok(AppendOutcome::Unchanged),
            Some(_) => AppendOutcome::Replaced,
        };

        Arc::make_mut(&mut self.candles).insert(timestamp, candle);
        if candle.is_finalized() {
            self.provisional.remove(&timestamp);
            self.last_finalized = self.last_finalized.max(Some(timestamp));
        } else {
            self.provisional.insert(timestamp);
        }
        Ok(outcome)
    }
}

/// Append-only store of 1-minute base candles, partitioned by symbol.
///
/// Each symbol has its own lock, so appends for different symbols never wait
/// on each other. The registry lock is only held long enough to look up or
/// create a symbol's book.
#[derive(Debug, Default)]
pub struct CandleStore {
    books: RwLock<HashMap<Symbol, Arc<RwLock<SymbolBook>>>>,
}

impl CandleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a base candle.
    ///
    /// A provisional candle at the same timestamp is replaced. A finalized
    /// candle may only be re-delivered with identical values, which is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::MalformedEvent`] if the candle violates the OHLC
    /// invariants and [`KandleError::ImmutableCandleConflict`] if it would
    /// change a finalized candle.
    pub fn append(&self, symbol: &Symbol, candle: Candle) -> Result<AppendOutcome> {
        candle.validate()?;

        let book = self.book_or_insert(symbol);
        let outcome = book.write().append(symbol, candle)?;
        debug!(
            %symbol,
            timestamp = %candle.timestamp,
            state = %candle.state,
            ?outcome,
            "append"
        );
        Ok(outcome)
    }

    /// Returns the candles with `from <= timestamp < to`.
    ///
    /// The returned view is a snapshot: later appends do not show up in it.
    /// An inverted range yields an empty view.
    #[must_use]
    pub fn range(&self, symbol: &Symbol, from: Timestamp, to: Timestamp) -> CandleRange {
        let to = to.max(from);
        self.view(symbol, Bound::Included(from), Bound::Excluded(to))
    }

    /// Returns the candles with `timestamp >= from`.
    #[must_use]
    pub fn range_from(&self, symbol: &Symbol, from: Timestamp) -> CandleRange {
        self.view(symbol, Bound::Included(from), Bound::Unbounded)
    }

    /// Returns every candle of the symbol.
    #[must_use]
    pub fn snapshot(&self, symbol: &Symbol) -> CandleRange {
        self.view(symbol, Bound::Unbounded, Bound::Unbounded)
    }

    /// Returns the most recent candle.
    #[must_use]
    pub fn latest(&self, symbol: &Symbol) -> Option<Candle> {
        let book = self.book(symbol)?;
        let book = book.read();
        book.candles.values().next_back().copied()
    }

    /// Returns the timestamp of the most recent finalized candle.
    #[must_use]
    pub fn latest_finalized(&self, symbol: &Symbol) -> Option<Timestamp> {
        self.book(symbol)?.read().last_finalized
    }

    /// Returns the latest timestamp at or before which every stored candle is
    /// finalized.
    ///
    /// This is the newest candle older than the earliest provisional one, or
    /// the latest finalized candle when nothing is provisional.
    #[must_use]
    pub fn finalized_frontier(&self, symbol: &Symbol) -> Option<Timestamp> {
        let book = self.book(symbol)?;
        let book = book.read();
        match book.provisional.first() {
            Some(&earliest) => book.candles.range(..earliest).next_back().map(|(ts, _)| *ts),
            None => book.last_finalized,
        }
    }

    /// Returns the timestamp of the oldest candle that is still provisional.
    #[must_use]
    pub fn earliest_provisional(&self, symbol: &Symbol) -> Option<Timestamp> {
        self.book(symbol)?.read().provisional.first().copied()
    }

    /// Returns the number of candles stored for the symbol.
    #[must_use]
    pub fn len(&self, symbol: &Symbol) -> usize {
        self.book(symbol).map_or(0, |book| book.read().candles.len())
    }

    /// Returns true if nothing is stored for the symbol.
    #[must_use]
    pub fn is_empty(&self, symbol: &Symbol) -> bool {
        self.len(symbol) == 0
    }

    /// Returns the symbols with stored candles, sorted.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<_> = self.books.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    fn view(&self, symbol: &Symbol, lower: Bound<Timestamp>, upper: Bound<Timestamp>) -> CandleRange {
        let candles = self
            .book(symbol)
            .map(|book| Arc::clone(&book.read().candles))
            .unwrap_or_default();
        CandleRange {
            candles,
            lower,
            upper,
        }
    }

    fn book(&self, symbol: &Symbol) -> Option<Arc<RwLock<SymbolBook>>> {
        self.books.read().get(symbol).cloned()
    }

    fn book_or_insert(&self, symbol: &Symbol) -> Arc<RwLock<SymbolBook>> {
        if let Some(book) = self.book(symbol) {
            return book;
        }
        Arc::clone(self.books.write().entry(symbol.clone()).or_default())
    }
}

/// Lazy, restartable view over a snapshot of a symbol's base candles.
///
/// Iterating twice yields the same candles in the same order.
#[derive(Debug, Clone)]
pub struct CandleRange {
    candles: Arc<CandleMap>,
    lower: Bound<Timestamp>,
    upper: Bound<Timestamp>,
}

impl CandleRange {
    /// Returns an iterator over the candles in timestamp order.
    #[must_use]
    pub fn iter(&self) -> CandleRangeIter<'_> {
        CandleRangeIter {
            inner: self.candles.range((self.lower, self.upper)),
        }
    }

    /// Returns the number of candles in the view.
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if the view holds no candles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Returns the first candle in the view.
    #[must_use]
    pub fn first(&self) -> Option<&Candle> {
        self.iter().next()
    }

    /// Returns the last candle in the view.
    #[must_use]
    pub fn last(&self) -> Option<&Candle> {
        self.iter().next_back()
    }

    /// Collects the view into a base-resolution series.
    #[must_use]
    pub fn to_series(&self) -> CandleSeries {
        CandleSeries::from_candles(Timeframe::BASE, self.iter().copied().collect())
    }
}

impl<'a> IntoIterator for &'a CandleRange {
    type Item = &'a Candle;
    type IntoIter = CandleRangeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`CandleRange`].
#[derive(Debug)]
pub struct CandleRangeIter<'a> {
    inner: btree_map::Range<'a, Timestamp, Candle>,
}

impl<'a> Iterator for CandleRangeIter<'a> {
    type Item = &'a Candle;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, candle)| candle)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for CandleRangeIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, candle)| candle)
    }
}
