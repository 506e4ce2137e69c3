use common::{BacktestError, Result, Trade};

/// The single long position the simulation may hold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    /// Bar index the position was opened on
    pub entry_index: usize,
    pub entry_price: f64,
    pub shares: f64,
    pub cost: f64,
}

impl OpenPosition {
    /// Bars elapsed since entry
    pub fn bars_held(&self, idx: usize) -> usize {
        idx.saturating_sub(self.entry_index)
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }
}

/// Flat or long; no pyramiding, no shorting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long(OpenPosition),
}

/// Cash plus at most one open position, with the trade log it produced
#[derive(Debug, Clone)]
pub struct Portfolio {
    cash: f64,
    state: PositionState,
    trades: Vec<Trade>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            state: PositionState::Flat,
            trades: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn has_position(&self) -> bool {
        matches!(self.state, PositionState::Long(_))
    }

    pub fn current_position(&self) -> Option<&OpenPosition> {
        match &self.state {
            PositionState::Long(pos) => Some(pos),
            PositionState::Flat => None,
        }
    }

    /// Cash plus position marked at `price`
    pub fn equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .current_position()
                .map(|pos| pos.market_value(price))
                .unwrap_or(0.0)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    /// Spend `allocation` cash units on shares at `price` and log the entry.
    ///
    /// The allocation is capped at available cash, so cash never goes negative.
    pub fn open_position(
        &mut self,
        idx: usize,
        date: Option<&str>,
        price: f64,
        allocation: f64,
    ) -> Result<&Trade> {
        if let PositionState::Long(pos) = &self.state {
            return Err(BacktestError::PositionAlreadyOpen {
                entry_index: pos.entry_index,
            });
        }

        let allocation = allocation.min(self.cash);
        let shares = allocation / price;
        self.cash -= allocation;
        self.state = PositionState::Long(OpenPosition {
            entry_index: idx,
            entry_price: price,
            shares,
            cost: allocation,
        });

        self.trades
            .push(Trade::entry(date.map(str::to_string), price, shares, allocation));
        Ok(&self.trades[self.trades.len() - 1])
    }

    /// Sell every share at `price` and log the exit
    pub fn close_position(&mut self, date: Option<&str>, price: f64) -> Result<&Trade> {
        let PositionState::Long(pos) = std::mem::take(&mut self.state) else {
            return Err(BacktestError::NoPositionToClose);
        };

        let proceeds = pos.market_value(price);
        self.cash += proceeds;

        self.trades
            .push(Trade::exit(date.map(str::to_string), price, pos.shares, proceeds));
        Ok(&self.trades[self.trades.len() - 1])
    }
}
