use std::io::Write;

use simplefs::{Disk, FileType, Filesystem};

const DEFAULT_IMAGE: &str = "/tmp/simplefs.img";

fn prompt(separator: &str) -> Option<Vec<String>> {
    let mut line = String::new();
    print!("{separator}");
    std::io::stdout().flush().ok()?;
    match std::io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.split_whitespace().map(str::to_string).collect()),
    }
}

fn execute(fs: &mut Filesystem, cmd: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if cmd.is_empty() {
        return Ok(());
    }
    match cmd[0].as_str() {
        "s" => println!["{}", fs.superblock()?],
        "b" => {
            if cmd.len() == 2 {
                println!["{}", fs.load_block(cmd[1].parse()?)?];
            } else {
                println!["{}", fs.bitmap()?]
            }
        }
        "i" if cmd.len() == 2 => {
            let index = cmd[1].parse()?;
            println!["inode {index}\n{}", fs.load_inode(index)?];
        }
        "d" => print!["{}", fs.debug_dump()?],
        "l" => {
            let path = cmd.get(1).map(String::as_str).unwrap_or("/");
            let dir = fs.resolve_path(path)?;
            for entry in fs.list_directory(dir)? {
                let size = fs.get_size(entry.inode())?;
                let kind = match entry.kind() {
                    FileType::RegularFile => '-',
                    FileType::Directory => 'd',
                };
                println!["{kind} {:>6} {:>8} {}", entry.inode(), size, entry.name()];
            }
        }
        "h" | "?" => println!["s | b [N] | i N | d | l [PATH] | q"],
        other => eprintln!["unknown command {other}"],
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let image = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_IMAGE.to_owned());
    let file = std::fs::File::options()
        .read(true)
        .write(false)
        .open(&image)?;
    let mut fs = Filesystem::new(Box::new(Disk::new(file)?));
    fs.mount()?;
    while let Some(cmd) = prompt(">> ") {
        if cmd.first().map(String::as_str) == Some("q") {
            break;
        }
        if let Err(e) = execute(&mut fs, &cmd) {
            eprintln!("{e}");
        }
    }
    Ok(())
}
