use std::path::{Path, PathBuf};

use editor_block::{EditorSession, Shell, SyncStatus};
use export_block::{ExportFormat, ExportOptions, ExportedFile};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{Command, Error};

pub(crate) async fn run(shell: &mut Shell, command: Command) -> Result<(), Error> {
    match command {
        Command::List => {
            for report in shell.reports() {
                let title = if report.title.trim().is_empty() { "(untitled)" } else { report.title.as_str() };
                let date = report
                    .created_at_utc()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {}  {:<32}  {} point(s)  {}",
                    report.report_id,
                    date,
                    title,
                    report.points.len(),
                    report.owner_email
                );
            }
            Ok(())
        }
        Command::New { title, area } => {
            let mut session = shell.create_report().await?;
            if let Some(title) = title {
                session.set_title(title).await?;
            }
            if let Some(area) = area {
                session.set_area(area).await?;
            }
            println!("{}", session.report().report_id);
            close(shell, session).await
        }
        Command::Edit { report_id } => {
            let session = shell.open_report(&report_id)?;
            interactive(shell, session).await
        }
        Command::Title { report_id, title } => {
            let mut session = shell.open_report(&report_id)?;
            session.set_title(title).await?;
            close(shell, session).await
        }
        Command::Area { report_id, area } => {
            let mut session = shell.open_report(&report_id)?;
            session.set_area(area).await?;
            close(shell, session).await
        }
        Command::AddPoint { report_id, text } => {
            let mut session = shell.open_report(&report_id)?;
            let point_id = session.add_point().await?;
            if let Some(text) = text {
                session.edit_point_text(&point_id, text).await?;
            }
            println!("{}", point_id);
            close(shell, session).await
        }
        Command::EditPoint {
            report_id,
            point_id,
            text,
        } => {
            let mut session = shell.open_report(&report_id)?;
            session.edit_point_text(&point_id, text).await?;
            close(shell, session).await
        }
        Command::RemovePoint { report_id, point_id } => {
            let mut session = shell.open_report(&report_id)?;
            session.remove_point(&point_id).await?;
            close(shell, session).await
        }
        Command::Attach {
            report_id,
            point_id,
            files,
        } => {
            let mut session = shell.open_report(&report_id)?;
            let paths = session.attach_images(&point_id, read_files(&files).await?).await?;
            for path in paths {
                println!("{}", path);
            }
            close(shell, session).await
        }
        Command::RemoveImage {
            report_id,
            point_id,
            path,
        } => {
            let mut session = shell.open_report(&report_id)?;
            session.remove_image(&point_id, &path).await?;
            close(shell, session).await
        }
        Command::Delete { report_id } => {
            shell.delete_report(&report_id).await?;
            Ok(())
        }
        Command::Export {
            report_id,
            format,
            image_width,
            out,
        } => {
            let session = shell.open_report(&report_id)?;
            let options = ExportOptions::with_image_width_percent(image_width);
            let file = session.export(format.into(), options).await?;
            let written = write_export(&out, &file).await?;
            println!("{}", written.display());
            close(shell, session).await
        }
    }
}

async fn close(shell: &mut Shell, session: EditorSession) -> Result<(), Error> {
    match shell.close_editor(session).await {
        SyncStatus::Saved => Ok(()),
        status => Err(format!("report left in state {:?}", status).into()),
    }
}

async fn read_files(files: &[PathBuf]) -> Result<Vec<Vec<u8>>, Error> {
    let mut out = Vec::with_capacity(files.len());
    for file in files {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| format!("cannot read {}: {}", file.display(), e))?;
        out.push(bytes);
    }
    Ok(out)
}

/// Only called with a fully rendered file; nothing is written on failure
async fn write_export(dir: &Path, file: &ExportedFile) -> Result<PathBuf, Error> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&file.filename);
    tokio::fs::write(&path, &file.bytes).await?;
    tracing::info!("⬇️ Wrote {} ({})", path.display(), file.format.mime_type());
    Ok(path)
}

const EDIT_HELP: &str = "\
commands:
  title <text>             set the title
  area <text>              set the area
  text <n> <text>          replace the text of point n
  add                      append a point
  rm <n>                   remove point n
  attach <n> <file>...     attach image files to point n
  unattach <n> <path>      remove an image from point n
  url <path>               temporary link to an attached image
  export pdf|docx [dir]    export the report
  show                     print the report
  save                     save now
  quit                     save and leave";

/// Line-oriented editor. Text edits autosave after the quiet period.
async fn interactive(shell: &mut Shell, mut session: EditorSession) -> Result<(), Error> {
    if !session.is_editable() {
        println!("(read-only: you do not own this report)");
    }
    println!("{}", EDIT_HELP);
    print_report(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_line(&mut session, line.trim()).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            _ = session.wait_for_deadline() => {
                if let Err(e) = session.flush_if_due().await {
                    eprintln!("error: {}", e);
                }
            }
        }
    }

    close(shell, session).await
}

fn point_id(session: &EditorSession, number: &str) -> Result<String, Error> {
    let n: usize = number.parse().map_err(|_| format!("not a point number: {}", number))?;
    session
        .report()
        .points
        .get(n.wrapping_sub(1))
        .map(|p| p.point_id.clone())
        .ok_or_else(|| format!("no point {}", n).into())
}

/// `Ok(false)` ends the loop
async fn handle_line(session: &mut EditorSession, line: &str) -> Result<bool, Error> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "" => {}
        "quit" | "exit" => return Ok(false),
        "help" => println!("{}", EDIT_HELP),
        "show" => print_report(session),
        "title" => session.set_title(rest).await?,
        "area" => session.set_area(rest).await?,
        "text" => {
            let (number, text) = rest.split_once(' ').unwrap_or((rest, ""));
            let id = point_id(session, number)?;
            session.edit_point_text(&id, text).await?;
        }
        "add" => {
            session.add_point().await?;
            println!("point {} added", session.report().points.len());
        }
        "rm" => {
            let id = point_id(session, rest.trim())?;
            session.remove_point(&id).await?;
        }
        "attach" => {
            let mut args = rest.split_whitespace();
            let id = point_id(session, args.next().unwrap_or(""))?;
            let files: Vec<PathBuf> = args.map(PathBuf::from).collect();
            for path in session.attach_images(&id, read_files(&files).await?).await? {
                println!("{}", path);
            }
        }
        "unattach" => {
            let (number, path) = rest.split_once(' ').unwrap_or((rest, ""));
            let id = point_id(session, number)?;
            session.remove_image(&id, path.trim()).await?;
        }
        "url" => println!("{}", session.image_url(rest.trim()).await?),
        "export" => {
            let mut args = rest.split_whitespace();
            let format = match args.next() {
                Some("docx") => ExportFormat::Docx,
                _ => ExportFormat::Pdf,
            };
            let dir = PathBuf::from(args.next().unwrap_or("."));
            let file = session.export(format, ExportOptions::default()).await?;
            println!("{}", write_export(&dir, &file).await?.display());
        }
        "save" => session.flush().await?,
        other => println!("unknown command {:?}, try help", other),
    }
    Ok(true)
}

fn print_report(session: &EditorSession) {
    let report = session.report();
    println!("# {}  [{:?}]", report.title, session.status());
    if !report.area.is_empty() {
        println!("area: {}", report.area);
    }
    for (i, point) in report.points.iter().enumerate() {
        println!("{}. {}", i + 1, point.text);
        for image in &point.images {
            println!("   - {}", image);
        }
    }
}
