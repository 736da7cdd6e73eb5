use criterion::{Criterion, black_box, criterion_group, criterion_main};
use real_estate_listings::api::models::CreateListingRequest;
use real_estate_listings::domain::{Listing, ListingStatus, Money};
use validator::Validate;

fn bench_validation(c: &mut Criterion) {
    let request: CreateListingRequest = serde_json::from_value(serde_json::json!({
        "title": "Light-filled 3-bed near downtown",
        "price": {"amount": 350000.00, "currency": "USD"},
        "description": "Renovated kitchen, hardwood floors, walk to transit.",
        "address": {"street": "123 Maple Ave", "city": "Springfield", "state": "IL", "zipCode": "62704"}
    }))
    .unwrap();

    c.bench_function("validate_create_listing_request", |b| {
        b.iter(|| {
            let _ = black_box(&request).validate();
        })
    });
}

fn bench_lifecycle(c: &mut Criterion) {
    c.bench_function("listing_create_publish_archive", |b| {
        b.iter(|| {
            let mut listing = Listing::create(
                black_box("Standard Listing Title"),
                Money::from_dollars(250_000),
                None,
                None,
            )
            .unwrap();
            listing.transition_to(ListingStatus::Published).unwrap();
            listing.archive().unwrap();
            listing
        })
    });
}

criterion_group!(benches, bench_validation, bench_lifecycle);
criterion_main!(benches);
