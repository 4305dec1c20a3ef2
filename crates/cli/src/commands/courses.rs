//! Courses command handler.

use clap::Args;
use tutor_core::config::AppConfig;

/// List indexed courses
#[derive(Args, Debug)]
pub struct CoursesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CoursesCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing courses command");

        let system = super::build_system(config).await?;
        let analytics = system.course_analytics().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&analytics)?);
            return Ok(());
        }

        println!("Courses: {}", analytics.total_courses);
        for title in &analytics.course_titles {
            println!("- {}", title);
        }

        Ok(())
    }
}
