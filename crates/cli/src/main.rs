use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{
    Course, Recommendation, User, load_courses, load_users, write_courses, write_recommendations,
    write_users,
};
use pipeline::{
    Adjuster, ExclusionFilter, LevelWeightAdjuster, RecommendationPipeline, TfidfScorer,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// RecFlow - batch course recommendation engine
#[derive(Parser)]
#[command(name = "recflow")]
#[command(about = "Run the course recommendation pipeline on local dataset files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the recommendation pipeline and print or write the result
    Recommend {
        /// Path to the users table (Parquet or CSV)
        #[arg(long)]
        users: PathBuf,

        /// Path to the courses table (Parquet or CSV)
        #[arg(long)]
        courses: PathBuf,

        /// Number of recommendations per user
        #[arg(long, default_value = "10")]
        top_k: usize,

        /// Write the result to this Parquet file instead of printing
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip the level-distance score adjustment
        #[arg(long)]
        no_adjust: bool,
    },

    /// Generate deterministic mock dataset files
    GenerateMock {
        /// Number of users to generate
        #[arg(long, default_value = "50")]
        users: usize,

        /// Number of courses to generate
        #[arg(long, default_value = "100")]
        courses: usize,

        /// Size of the tag universe
        #[arg(long, default_value = "20")]
        tags: u32,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Directory for users.parquet and courses.parquet
        #[arg(long, default_value = "test_data")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Recommend {
            users,
            courses,
            top_k,
            output,
            no_adjust,
        } => handle_recommend(users, courses, top_k, output, no_adjust),
        Commands::GenerateMock {
            users,
            courses,
            tags,
            seed,
            output_dir,
        } => handle_generate_mock(users, courses, tags, seed, output_dir),
    }
}

/// Handle the 'recommend' command
fn handle_recommend(
    users_path: PathBuf,
    courses_path: PathBuf,
    top_k: usize,
    output: Option<PathBuf>,
    no_adjust: bool,
) -> Result<()> {
    let start = Instant::now();
    let users = load_users(&users_path).context("Failed to load users table")?;
    let courses = load_courses(&courses_path).context("Failed to load courses table")?;
    println!(
        "{} Loaded {} users and {} courses in {:?}",
        "✓".green(),
        users.len(),
        courses.len(),
        start.elapsed()
    );

    let adjuster: Option<Box<dyn Adjuster>> = if no_adjust {
        None
    } else {
        Some(Box::new(LevelWeightAdjuster::with_default_weights()))
    };
    let pipeline = RecommendationPipeline::new(TfidfScorer, ExclusionFilter, adjuster);

    let start = Instant::now();
    let result = pipeline.run(&users, &courses, top_k)?;
    let user_count = result
        .iter()
        .map(|row| row.user_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    println!(
        "{} {} recommendations for {} users in {:?}",
        "✓".green(),
        result.len(),
        user_count,
        start.elapsed()
    );

    match output {
        Some(path) => {
            write_recommendations(&path, &result)?;
            println!("{} Wrote {}", "✓".green(), path.display());
        }
        None => print_recommendations(&result),
    }
    Ok(())
}

fn print_recommendations(result: &[Recommendation]) {
    // Fallback rows are appended after the ranked rows; regroup for display.
    let mut rows: Vec<&Recommendation> = result.iter().collect();
    rows.sort_by(|a, b| a.user_id.cmp(&b.user_id).then(a.rank.cmp(&b.rank)));

    let mut current_user: Option<&str> = None;
    for row in rows {
        if current_user != Some(row.user_id.as_str()) {
            current_user = Some(row.user_id.as_str());
            println!("{}", row.user_id.bold().blue());
        }
        let score = if row.score > 0.0 {
            format!("{:.4}", row.score)
        } else {
            "fallback".to_string()
        };
        println!("  {}. {} ({})", row.rank, row.course_id, score);
    }
}

/// Handle the 'generate-mock' command
fn handle_generate_mock(
    n_users: usize,
    n_courses: usize,
    num_tags: u32,
    seed: u64,
    output_dir: PathBuf,
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);

    let courses: Vec<Course> = (0..n_courses)
        .map(|i| Course {
            id: format!("course_{i:04}"),
            tags: sample_tags(&mut rng, num_tags),
            level: rng.random_range(0..=3u8),
        })
        .collect();

    let users: Vec<User> = (0..n_users)
        .map(|i| {
            let num_purchased = rng.random_range(0..=3usize);
            let num_created = rng.random_range(0..=1usize);
            User {
                id: format!("user_{i:04}"),
                interest_tags: sample_tags(&mut rng, num_tags),
                level: rng.random_range(0..=3u8),
                purchased_course_ids: (0..num_purchased)
                    .map(|_| format!("course_{:04}", rng.random_range(0..n_courses)))
                    .collect(),
                created_course_ids: (0..num_created)
                    .map(|_| format!("course_{:04}", rng.random_range(0..n_courses)))
                    .collect(),
            }
        })
        .collect();

    let users_path = output_dir.join("users.parquet");
    let courses_path = output_dir.join("courses.parquet");
    write_users(&users_path, &users)?;
    write_courses(&courses_path, &courses)?;

    println!(
        "{} Generated {} users -> {}",
        "✓".green(),
        users.len(),
        users_path.display()
    );
    println!(
        "{} Generated {} courses -> {}",
        "✓".green(),
        courses.len(),
        courses_path.display()
    );
    Ok(())
}

/// Between one and five distinct tags drawn from `1..=num_tags`.
fn sample_tags(rng: &mut StdRng, num_tags: u32) -> Vec<u32> {
    let count = rng.random_range(1..=5usize).min(num_tags as usize);
    rand::seq::index::sample(rng, num_tags as usize, count)
        .iter()
        .map(|i| i as u32 + 1)
        .collect()
}
