//! Ranked views over the parsed records.
//!
//! Four orderings, each truncated to the top N. Sorting is stable, so records
//! with equal keys keep their listing order.

use std::cmp::Ordering;

use stonks_core::domain::EntityRecord;

/// The key a view is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankingKey {
    /// Highest converted price first.
    Price,
    /// Lowest P/E first; records without a usable P/E go last.
    PeRatio,
    /// Highest year growth first.
    Growth,
    /// Highest 52-week upside first.
    PotentialProfit,
}

impl RankingKey {
    pub const ALL: [RankingKey; 4] = [
        RankingKey::Price,
        RankingKey::PeRatio,
        RankingKey::Growth,
        RankingKey::PotentialProfit,
    ];

    /// Snapshot file name. The `10` stays fixed whatever N is configured.
    pub fn file_name(&self) -> &'static str {
        match self {
            RankingKey::Price => "top_10_price.json",
            RankingKey::PeRatio => "top_10_pe.json",
            RankingKey::Growth => "top_10_growth.json",
            RankingKey::PotentialProfit => "top_10_potential_profit.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankingKey::Price => "price",
            RankingKey::PeRatio => "P/E",
            RankingKey::Growth => "growth",
            RankingKey::PotentialProfit => "potential profit",
        }
    }

    /// Only the growth view persists the growth column.
    pub fn includes_growth(&self) -> bool {
        matches!(self, RankingKey::Growth)
    }

    pub fn compare(&self, a: &EntityRecord, b: &EntityRecord) -> Ordering {
        match self {
            RankingKey::Price => b.price.cmp(&a.price),
            RankingKey::PeRatio => a.pe.cmp(&b.pe),
            RankingKey::Growth => b.growth.total_cmp(&a.growth),
            RankingKey::PotentialProfit => b.potential_profit.cmp(&a.potential_profit),
        }
    }
}

impl std::fmt::Display for RankingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Top-N records under one key.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedView {
    pub key: RankingKey,
    pub records: Vec<EntityRecord>,
}

impl RankedView {
    pub fn build(key: RankingKey, records: &[EntityRecord], top_n: usize) -> Self {
        let mut ranked: Vec<&EntityRecord> = records.iter().collect();
        // `sort_by` is stable: ties keep listing order.
        ranked.sort_by(|a, b| key.compare(a, b));
        ranked.truncate(top_n);
        Self {
            key,
            records: ranked.into_iter().cloned().collect(),
        }
    }

    /// Number of ranked records, at most the view's `top_n`.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no record made it into the view.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Build all four views, in `RankingKey::ALL` order.
pub fn rank_all(records: &[EntityRecord], top_n: usize) -> Vec<RankedView> {
    RankingKey::ALL
        .iter()
        .map(|&key| RankedView::build(key, records, top_n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use stonks_core::domain::PeRatio;

    fn record(code: &str, price: i64, pe: Option<i64>, profit: i64, growth: f64) -> EntityRecord {
        EntityRecord {
            name: format!("{code} Inc"),
            code: code.to_string(),
            price: Decimal::from(price),
            pe: pe.map_or(PeRatio::Missing, |v| PeRatio::Value(Decimal::from(v))),
            potential_profit: Decimal::from(profit),
            growth,
        }
    }

    fn codes(view: &RankedView) -> Vec<&str> {
        view.records.iter().map(|r| r.code.as_str()).collect()
    }

    #[test]
    fn each_key_orders_its_view() {
        let records = vec![
            record("A", 10, Some(30), 5, 1.5),
            record("B", 30, None, 50, -2.0),
            record("C", 20, Some(12), 20, 9.0),
        ];
        let views = rank_all(&records, 10);

        assert_eq!(views.len(), 4);
        assert_eq!(codes(&views[0]), ["B", "C", "A"]);
        assert_eq!(codes(&views[1]), ["C", "A", "B"]);
        assert_eq!(codes(&views[2]), ["C", "A", "B"]);
        assert_eq!(codes(&views[3]), ["B", "C", "A"]);
    }

    #[test]
    fn missing_pe_ranks_last_even_behind_zero() {
        let records = vec![
            record("NONE", 1, None, 0, 0.0),
            record("HIGH", 1, Some(500), 0, 0.0),
            record("ZERO", 1, Some(0), 0, 0.0),
        ];
        let view = RankedView::build(RankingKey::PeRatio, &records, 10);
        assert_eq!(codes(&view), ["ZERO", "HIGH", "NONE"]);
    }

    #[test]
    fn ties_keep_listing_order() {
        let records = vec![
            record("FIRST", 100, Some(10), 7, 3.0),
            record("SECOND", 100, Some(10), 7, 3.0),
            record("THIRD", 100, Some(10), 7, 3.0),
        ];
        for view in rank_all(&records, 10) {
            assert_eq!(codes(&view), ["FIRST", "SECOND", "THIRD"], "{}", view.key);
        }
    }

    #[test]
    fn views_truncate_to_top_n() {
        let records: Vec<_> = (0..25)
            .map(|i| record(&format!("C{i}"), i, Some(i), i, i as f64))
            .collect();
        for view in rank_all(&records, 10) {
            assert_eq!(view.len(), 10);
        }
        for view in rank_all(&records[..4], 10) {
            assert_eq!(view.len(), 4);
        }
    }

    #[test]
    fn empty_input_gives_empty_views() {
        let views = rank_all(&[], 10);
        assert_eq!(views.len(), 4);
        assert!(views.iter().all(RankedView::is_empty));
    }

    #[test]
    fn file_names_are_fixed() {
        let names: Vec<_> = RankingKey::ALL.iter().map(|k| k.file_name()).collect();
        assert_eq!(
            names,
            [
                "top_10_price.json",
                "top_10_pe.json",
                "top_10_growth.json",
                "top_10_potential_profit.json"
            ]
        );
    }
}
