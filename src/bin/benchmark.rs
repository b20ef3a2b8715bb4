use anyhow::{bail, Context};
use chrono::{Duration as ChronoDuration, Utc};
use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const DURATION_SECS: u64 = 10;
const RACE_CLIENTS: usize = 50;

struct Target {
    name: &'static str,
    url: String,
}

struct Fixture {
    provider_id: String,
    slug: String,
    service_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("BENCH_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    println!("{}", "🚀 Starting Benchmark Suite".bold().green());
    println!("Target URL: {}", base_url);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()?;

    if client.get(format!("{}/health", base_url)).send().await.is_err() {
        bail!("server is not reachable at {}; start it first", base_url);
    }

    println!("\n{}", "⚙️  Setting up benchmark data...".yellow());
    let fixture = setup_provider(&client, &base_url).await?;
    println!("{}", "✅ Data created successfully.".green());
    println!("   Provider ID: {}", fixture.provider_id);
    println!("   Service ID:  {}", fixture.service_id);

    let today = Utc::now().date_naive();
    let targets = vec![
        Target {
            name: "Health Check",
            url: format!("{}/health", base_url),
        },
        Target {
            name: "Provider Landing (by slug)",
            url: format!("{}/api/providerprofiles/by-slug/{}", base_url, fixture.slug),
        },
        Target {
            name: "Day Availability",
            url: format!(
                "{}/api/availability/{}?date={}&serviceId={}",
                base_url, fixture.provider_id, today, fixture.service_id
            ),
        },
        Target {
            name: "Available Dates (31 days)",
            url: format!(
                "{}/api/availability/{}/dates?start={}&end={}&serviceId={}",
                base_url,
                fixture.provider_id,
                today,
                today + ChronoDuration::days(30),
                fixture.service_id
            ),
        },
    ];

    let rps_stages = vec![10, 50, 200, 1000];

    for target in targets {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking Endpoint: {}", target.name.cyan().bold());
        println!("URL: {}", target.url);
        println!("{}", "=".repeat(60));

        println!("{:<10} | {:<15} | {:<15} | {:<15}", "RPS", "Mean (ms)", "P99 (ms)", "Success Rate");
        println!("{:-<10}-+-{:-<15}-+-{:-<15}-+-{:-<15}", "", "", "", "");

        for &rps in &rps_stages {
            run_stage(&client, &target, rps).await?;
        }
    }

    race_check(&client, &base_url, &fixture).await
}

async fn post_json(client: &Client, url: String, body: Value) -> anyhow::Result<Value> {
    let res = client.post(&url).json(&body).send().await
        .with_context(|| format!("request to {} failed", url))?;
    let status = res.status();
    if !status.is_success() {
        let txt = res.text().await.unwrap_or_default();
        bail!("POST {} returned {}: {}", url, status, txt);
    }
    Ok(res.json().await?)
}

async fn setup_provider(client: &Client, base_url: &str) -> anyhow::Result<Fixture> {
    let slug = format!("bench-{}", Uuid::new_v4());
    let provider = post_json(client, format!("{}/api/providerprofiles", base_url), json!({
        "name": "Benchmark Studio",
        "slug": slug,
        "category": "Wellness"
    })).await?;
    let provider_id = provider["id"].as_str().context("provider response without id")?.to_string();

    let all_day = "00:00-24:00";
    post_json(client, format!("{}/api/weeklyschedules", base_url), json!({
        "providerId": provider_id,
        "mondayEnabled": true, "mondayHours": all_day,
        "tuesdayEnabled": true, "tuesdayHours": all_day,
        "wednesdayEnabled": true, "wednesdayHours": all_day,
        "thursdayEnabled": true, "thursdayHours": all_day,
        "fridayEnabled": true, "fridayHours": all_day,
        "saturdayEnabled": true, "saturdayHours": all_day,
        "sundayEnabled": true, "sundayHours": all_day
    })).await?;

    let service = post_json(client, format!("{}/api/services", base_url), json!({
        "providerId": provider_id,
        "name": "Load Test Session",
        "price": 0,
        "durationMinutes": 30,
        "type": "APPOINTMENT"
    })).await?;
    let service_id = service["id"].as_str().context("service response without id")?.to_string();

    Ok(Fixture { provider_id, slug, service_id })
}

async fn run_stage(client: &Client, target: &Target, rps: u32) -> anyhow::Result<()> {
    let limiter = Arc::new(RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(rps).context("rps must be positive")?)
    ));

    let (tx, mut rx) = mpsc::channel(50000);
    let start_time = Instant::now();
    let duration = Duration::from_secs(DURATION_SECS);

    loop {
        if start_time.elapsed() > duration {
            break;
        }

        if limiter.check().is_ok() {
            let client = client.clone();
            let url = target.url.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let res = client.get(&url).send().await;
                let latency = req_start.elapsed();

                let success = match res {
                    Ok(r) => r.status().is_success(),
                    Err(_) => false,
                };

                let _ = tx.send((latency, success)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let mut histogram = Histogram::<u64>::new(3)?;
    let mut successes = 0;
    let mut total = 0;

    while let Some((latency, success)) = rx.recv().await {
        total += 1;
        if success { successes += 1; }
        histogram.record(latency.as_micros() as u64)?;
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let success_rate = if total > 0 { (successes as f64 / total as f64) * 100.0 } else { 0.0 };

    println!(
        "{:<10} | {:<15.2} | {:<15.2} | {:<14.1}%",
        rps,
        mean_ms,
        p99_ms,
        success_rate
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(())
}

/// Fires many simultaneous bookings at one slot; exactly one may win.
async fn race_check(client: &Client, base_url: &str, fixture: &Fixture) -> anyhow::Result<()> {
    println!("\n{}", "=".repeat(60));
    println!("{}", "Double-booking race check".cyan().bold());
    println!("{}", "=".repeat(60));

    let date = Utc::now().date_naive() + ChronoDuration::days(7);

    let (tx, mut rx) = mpsc::channel(RACE_CLIENTS);
    for i in 0..RACE_CLIENTS {
        let client = client.clone();
        let tx = tx.clone();
        let url = format!("{}/api/bookings", base_url);
        let body = json!({
            "serviceId": fixture.service_id,
            "clientId": format!("race-client-{}", i),
            "providerId": fixture.provider_id,
            "date": date.to_string(),
            "time": "12:00"
        });
        tokio::spawn(async move {
            let status = client.post(&url).json(&body).send().await.map(|r| r.status()).ok();
            let _ = tx.send(status).await;
        });
    }
    drop(tx);

    let (mut created, mut conflicts, mut other) = (0, 0, 0);
    while let Some(status) = rx.recv().await {
        match status {
            Some(StatusCode::CREATED) => created += 1,
            Some(StatusCode::CONFLICT) => conflicts += 1,
            _ => other += 1,
        }
    }

    println!("created: {}  conflicts: {}  other: {}", created, conflicts, other);
    if created == 1 {
        println!("{}", "✅ exactly one booking won the slot".green());
        Ok(())
    } else {
        println!("{}", "❌ slot was not booked exactly once".red().bold());
        bail!("race check failed: {} bookings created", created)
    }
}
