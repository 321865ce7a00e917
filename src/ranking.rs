// Offer ranking: cheapest "best flights" first

use crate::flight::{FlightOffer, SearchResults};
use std::cmp::Ordering;

pub const MAX_RANKED_OFFERS: usize = 3;

fn price_key(offer: &FlightOffer) -> f64 {
    offer.price.unwrap_or(f64::INFINITY)
}

/// Returns at most [`MAX_RANKED_OFFERS`] of the `best_flights`, cheapest first.
///
/// Offers without a price sort last. The sort is stable, so offers with equal
/// prices keep the order the search service returned them in.
pub fn rank_offers(results: &SearchResults) -> Vec<FlightOffer> {
    let mut offers = results.best_flights.clone();
    offers.sort_by(|a, b| {
        price_key(a)
            .partial_cmp(&price_key(b))
            .unwrap_or(Ordering::Equal)
    });
    offers.truncate(MAX_RANKED_OFFERS);
    offers
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn offer(price: Option<f64>, tag: &str) -> FlightOffer {
        FlightOffer {
            price,
            departure_token: Some(tag.to_string()),
            ..Default::default()
        }
    }

    fn results(offers: Vec<FlightOffer>) -> SearchResults {
        SearchResults {
            best_flights: offers,
            other_flights: Vec::new(),
        }
    }

    fn tags(offers: &[FlightOffer]) -> Vec<&str> {
        offers
            .iter()
            .map(|o| o.departure_token.as_deref().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_empty_results() {
        assert!(rank_offers(&SearchResults::default()).is_empty());
    }

    #[test]
    fn test_other_flights_are_not_ranked() {
        let raw = SearchResults {
            best_flights: Vec::new(),
            other_flights: vec![offer(Some(10.0), "cheap")],
        };
        assert!(rank_offers(&raw).is_empty());
    }

    #[test]
    fn test_keeps_three_cheapest() {
        let raw: SearchResults = serde_json::from_str(
            r#"{"best_flights": [{"price": 5000}, {"price": 3000}, {"price": 9000}, {"price": 1000}]}"#,
        )
        .unwrap();

        let prices: Vec<_> = rank_offers(&raw).iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![Some(1000.0), Some(3000.0), Some(5000.0)]);
    }

    #[test_case(vec![Some(200.0), None, Some(100.0)], vec!["c", "a", "b"]; "missing price sorts last")]
    #[test_case(vec![None, None, Some(1.0), None], vec!["c", "a", "b"]; "unpriced offers keep order")]
    #[test_case(vec![Some(50.0), Some(20.0), Some(50.0), Some(20.0)], vec!["b", "d", "a"]; "equal prices are stable")]
    #[test_case(vec![Some(7.0)], vec!["a"]; "single offer")]
    fn test_ranking_order(prices: Vec<Option<f64>>, expected: Vec<&str>) {
        let names = ["a", "b", "c", "d"];
        let offers = prices
            .into_iter()
            .zip(names)
            .map(|(price, name)| offer(price, name))
            .collect();

        let ranked = rank_offers(&results(offers));
        assert_eq!(tags(&ranked), expected);
    }

    #[test]
    fn test_ranked_prices_never_decrease() {
        let offers = (0..40)
            .map(|i| offer(Some(((i * 7919) % 97) as f64), &i.to_string()))
            .collect::<Vec<_>>();
        let input_len = offers.len();

        let ranked = rank_offers(&results(offers));
        assert!(ranked.len() <= MAX_RANKED_OFFERS);
        assert!(ranked.len() <= input_len);
        assert!(ranked
            .windows(2)
            .all(|pair| pair[0].price <= pair[1].price));
    }
}
