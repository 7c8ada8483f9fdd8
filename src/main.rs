use std::fs::read_to_string;

use bedplan::Problem;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or("Usage: <program> <bed_file.yaml>")?;

    let buf = read_to_string(path)?;
    let problem: Problem = serde_yaml::from_str(&buf)?;
    let solution = problem.solve()?;

    println!("{}", serde_yaml::to_string(&solution)?);
    Ok(())
}
