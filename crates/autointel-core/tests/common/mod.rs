#![allow(dead_code)]

use autointel_core::records::{RawArticle, RawRecord, RawReview};
use autointel_core::settings::Settings;

pub const VERDICTS: [&str; 4] = [
    "Excellent car with great value and a superb ride.",
    "Terrible handling and poor build quality.",
    "A decent family hatchback, nothing more.",
    "Good engine but the cabin feels cheap and noisy!",
];

pub fn review(url: &str, date: &str, rating: Option<&str>, price: Option<&str>) -> RawRecord {
    RawRecord::Review(RawReview {
        url: Some(url.to_string()),
        title: Some(format!("Review {url}")),
        author: Some("Staff".to_string()),
        publication_date: Some(date.to_string()),
        source: Some("Car Magazine".to_string()),
        verdict: Some("Solid car with a comfortable ride.".to_string()),
        rating: rating.map(str::to_string),
        price: price.map(str::to_string),
    })
}

pub fn article(url: &str, date: &str, content: &str) -> RawRecord {
    RawRecord::Article(RawArticle {
        url: Some(url.to_string()),
        title: Some(format!("Article {url}")),
        author: None,
        publication_date: Some(date.to_string()),
        source: Some("Auto News".to_string()),
        content: Some(content.to_string()),
    })
}

/// A review batch with varied price, rating, sentiment and length spread over
/// three months so every review statistic is defined.
pub fn varied_reviews(count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|i| {
            let month = i % 3 + 1;
            let day = i % 27 + 1;
            let rating = 1.0 + (i % 9) as f64 * 0.5;
            let price = 15_000 + (i % 7) * 11_000 + i * 37;
            let verdict = format!("{} {}", VERDICTS[i % VERDICTS.len()], "Tested on city roads. ".repeat(i % 5));
            RawRecord::Review(RawReview {
                url: Some(format!("https://reviews.example/{i}")),
                title: Some(format!("Road test {i}")),
                author: Some("Staff".to_string()),
                publication_date: Some(format!("2024-{month:02}-{day:02}")),
                source: Some(if i % 2 == 0 { "Car Magazine" } else { "Auto Express" }.to_string()),
                verdict: Some(verdict),
                rating: Some(format!("{rating:.1}")),
                price: Some(format!("${price}")),
            })
        })
        .collect()
}

pub fn test_settings() -> Settings {
    Settings {
        workers: 2,
        min_bucket_samples: 5,
        ..Settings::default()
    }
}
