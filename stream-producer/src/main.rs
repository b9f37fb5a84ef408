//! Synthetic product event generator.
//!
//! Puts fake product records onto the upload stream so the indexer's
//! direct-product mode has something to consume. Partition keys follow the
//! product name, so identically-named products land on the same shard.

use std::env;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::Client;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use stream_indexer_shared::ProductDocument;

const ADJECTIVES: &[&str] = &[
    "Rustic", "Sleek", "Incredible", "Practical", "Handcrafted", "Refined", "Ergonomic",
    "Intelligent", "Durable", "Compact",
];

const MATERIALS: &[&str] = &[
    "Steel", "Wooden", "Cotton", "Granite", "Rubber", "Bronze", "Plastic", "Concrete",
];

const NOUNS: &[&str] = &[
    "Chair", "Table", "Lamp", "Keyboard", "Widget", "Gadget", "Bottle", "Clock", "Shelf",
];

fn generate_product(rng: &mut impl Rng) -> ProductDocument {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Plain");
    let material = MATERIALS.choose(rng).copied().unwrap_or("Steel");
    let noun = NOUNS.choose(rng).copied().unwrap_or("Widget");

    let name = format!("{} {} {}", adjective, material, noun);
    let description = format!(
        "The {} is built from {} and fits every home",
        name.to_lowercase(),
        material.to_lowercase()
    );
    let price = (rng.gen_range(1.0..500.0_f64) * 100.0).round() / 100.0;

    ProductDocument {
        id: Uuid::new_v4().to_string(),
        name,
        description: Some(description),
        price,
    }
}

async fn send_event(
    client: &Client,
    stream_name: &str,
    product: &ProductDocument,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = serde_json::to_vec(product)?;

    let result = client
        .put_record()
        .stream_name(stream_name)
        .data(Blob::new(payload))
        .partition_key(&product.name)
        .send()
        .await?;

    println!("Sent product {} to shard {}", product.id, result.shard_id());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let stream_name =
        env::var("KINESIS_STREAM_NAME").unwrap_or_else(|_| "file-upload-stream".to_string());
    let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let count: usize = env::var("PRODUCT_COUNT")
        .unwrap_or_else(|_| "100".to_string())
        .parse()?;

    let mut aws_loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
    if let Ok(endpoint) = env::var("AWS_ENDPOINT_URL") {
        aws_loader = aws_loader.endpoint_url(endpoint);
    }
    let aws_config = aws_loader.load().await;
    let client = Client::new(&aws_config);

    println!("Sending {} products to {}", count, stream_name);

    let mut sent = 0;
    for _ in 0..count {
        let product = generate_product(&mut rand::thread_rng());
        match send_event(&client, &stream_name, &product).await {
            Ok(()) => sent += 1,
            Err(e) => eprintln!("Error sending event: {}", e),
        }
    }

    println!("Finished sending {} of {} events", sent, count);
    Ok(())
}
