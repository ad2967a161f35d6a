use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;

use chrono::Utc;
use job_board::catalog;
use job_board::commands::{self as jobs, CommandError};
use job_board::error::AppError;
use job_board::tenancy::{configure_site, Site, SiteConfigUpdate};
use job_board::JobBoard;
use tracing::info;

use crate::cli::{ConfigureArgs, SiteCommand, UserCommand};

pub(crate) async fn expire(board: &JobBoard) -> Result<String, AppError> {
    let reports = jobs::expire_jobs(&board.db, &board.lifecycle, Utc::now()).await?;
    Ok(lines(reports))
}

pub(crate) async fn send_mailshot(board: &JobBoard) -> Result<String, AppError> {
    let reports = jobs::send_mailshots(
        &board.db,
        board.integrations.mailing_lists.as_ref(),
        Utc::now(),
    )
    .await?;
    Ok(lines(reports))
}

pub(crate) async fn display_lists(board: &JobBoard, domain: &str) -> Result<String, AppError> {
    let output =
        jobs::display_lists(&board.db, board.integrations.mailing_lists.as_ref(), domain).await?;
    Ok(output.to_string())
}

pub(crate) async fn site(board: &JobBoard, command: SiteCommand) -> Result<String, AppError> {
    match command {
        SiteCommand::Add { domain, name } => {
            let tenant = board.db.create_site(domain.trim(), name.trim()).await?;
            info!(site_id = %tenant.id(), domain = %tenant.site.domain, "site registered");
            Ok(format!(
                "Site {} ({}) created with admin e-mail {}\n",
                tenant.site.name, tenant.site.domain, tenant.config.admin_email
            ))
        }
        SiteCommand::List => {
            let mut output = String::from("ID\tDomain\tName\n");
            for site in board.db.list_sites().await? {
                let _ = writeln!(output, "{}\t{}\t{}", site.id, site.domain, site.name);
            }
            Ok(output)
        }
        SiteCommand::Configure(args) => {
            let site = known_site(board, &args.domain).await?;
            let config = configure_site(&board.db, site.id, site_update(args)).await?;
            Ok(format!(
                "Site {} updated: expire_after={} admin_email={} price={} protocol={} remote={}\n",
                site.domain,
                config.expire_after,
                config.admin_email,
                config.price(),
                config.protocol,
                config.remote
            ))
        }
    }
}

fn site_update(args: ConfigureArgs) -> SiteConfigUpdate {
    SiteConfigUpdate {
        expire_after: args.expire_after,
        admin_email: args.admin_email,
        remote: args.remote,
        protocol: args.protocol,
        price: args.price,
        google_analytics: args.google_analytics,
        twitter: args.twitter,
        stripe_publishable_key: args.stripe_publishable_key,
        stripe_secret_key: args.stripe_secret_key,
        twitter_access_token: args.twitter_access_token,
        mailchimp_username: args.mailchimp_username,
        mailchimp_api_key: args.mailchimp_api_key,
        mailchimp_list_id: args.mailchimp_list_id,
    }
}

pub(crate) async fn add_category(
    board: &JobBoard,
    domain: &str,
    name: &str,
) -> Result<String, AppError> {
    let site = known_site(board, domain).await?;
    let category = catalog::add_category(&board.db, site.id, name).await?;
    Ok(format!(
        "Category {} added to {} as #{}\n",
        category.name, site.domain, category.id
    ))
}

pub(crate) async fn import_countries(board: &JobBoard, csv: &Path) -> Result<String, AppError> {
    let file = File::open(csv)?;
    let summary = jobs::import_countries(&board.db, file).await?;
    Ok(format!("{summary}\n"))
}

pub(crate) async fn user(board: &JobBoard, command: UserCommand) -> Result<String, AppError> {
    match command {
        UserCommand::Staff { username } => {
            let user = board
                .db
                .user_by_username(&username)
                .await?
                .ok_or_else(|| AppError::not_found(format!("User {username}")))?;
            let user = board.db.set_staff(user.id, true).await?;
            Ok(format!("{} is now a staff member\n", user.username))
        }
        UserCommand::Tokens { username, count } => {
            if count < 0 {
                return Err(AppError::BadRequest(
                    "token count must not be negative".to_string(),
                ));
            }
            let user = board
                .db
                .user_by_username(&username)
                .await?
                .ok_or_else(|| AppError::not_found(format!("User {username}")))?;
            let balance = board.db.set_user_tokens(user.id, count).await?;
            Ok(format!("{} now holds {} tokens\n", user.username, balance.tokens))
        }
    }
}

async fn known_site(board: &JobBoard, domain: &str) -> Result<Site, AppError> {
    board
        .db
        .site_by_domain(domain)
        .await?
        .ok_or_else(|| CommandError::UnknownSite(domain.to_string()).into())
}

fn lines<T: std::fmt::Display>(reports: Vec<T>) -> String {
    reports.iter().map(|report| format!("{report}\n")).collect()
}
