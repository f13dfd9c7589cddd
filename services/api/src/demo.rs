use crate::infra::InMemoryNotificationLog;
use clap::Args;
use std::sync::Arc;
use umpcast::config::OrderingConfig;
use umpcast::error::AppError;
use umpcast::league::{Application, LeagueServices, PostId, UserId};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Post the demo umpires apply to
    #[arg(long, default_value_t = 1)]
    pub(crate) post: u64,
    /// Number of umpires applying (at least two)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(2..=26))]
    pub(crate) applicants: u64,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { post, applicants } = args;
    let post = PostId(post);
    let log = Arc::new(InMemoryNotificationLog::default());
    let services = LeagueServices::in_memory(&OrderingConfig::default(), log.clone());

    println!("Casting demo for post {post}");
    let mut ids = Vec::new();
    for index in 0..applicants {
        let created = services.applications.create(Application {
            post,
            user: UserId(index + 1),
            comments: Some(format!("umpire {}", umpire_name(index))),
        })?;
        ids.push(created.id());
    }
    print_ranking(&services, post)?;

    let Some(&last) = ids.last() else {
        return Ok(());
    };
    println!("\nCasting application {last}");
    services.applications.cast(last)?;
    print_ranking(&services, post)?;

    if let Some(&first) = ids.first() {
        println!("\nWithdrawing application {first}");
        services.applications.delete(first)?;
        print_ranking(&services, post)?;
    }

    println!("\nNotifications sent");
    for note in log.entries() {
        println!(
            "- [{}] application {} (user {}): {}",
            note.notification_date_time.format("%H:%M:%S"),
            note.application,
            note.user,
            note.subject
        );
    }
    Ok(())
}

fn print_ranking(
    services: &LeagueServices<InMemoryNotificationLog>,
    post: PostId,
) -> Result<(), AppError> {
    println!("Ranking:");
    for entry in services.applications.list_scope(post)? {
        println!(
            "  {}. application {} -> {}",
            entry.entity.order(),
            entry.entity.id(),
            entry.status.label()
        );
    }
    Ok(())
}

fn umpire_name(index: u64) -> char {
    let offset = u8::try_from(index % 26).unwrap_or(0);
    char::from(b'A' + offset)
}
