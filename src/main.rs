use bookloom::{Book, ReaderConfig, Result, TocTreeStyle, TocTreeView};
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 📚 Bookloom - EPUB解析工具
#[derive(Parser)]
#[command(name = "bookloom")]
#[command(about = "一个用于读取EPUB文件的Rust工具")]
#[command(version)]
struct Args {
    /// EPUB文件路径
    #[arg(help = "要读取的EPUB文件路径")]
    epub_file: String,

    /// 详细输出模式
    #[arg(short, long, help = "输出调试日志")]
    verbose: bool,

    /// 显示元数据信息
    #[arg(short, long, help = "显示EPUB元数据信息")]
    metadata: bool,

    /// 显示目录树
    #[arg(short, long, help = "显示EPUB目录树结构")]
    toc: bool,

    /// 显示指定章节内容
    #[arg(short, long, help = "显示指定章节的内容（使用阅读顺序索引，从1开始）")]
    chapter: Option<usize>,

    /// 目录树显示样式
    #[arg(long, value_enum, default_value = "tree", help = "目录树的显示样式")]
    style: StyleArg,

    /// 章节内容最大显示长度
    #[arg(long, default_value = "2000", help = "章节内容最大显示字符数（0表示不限制）")]
    max_length: usize,

    /// 以YAML格式输出整本书的摘要
    #[arg(long, help = "以YAML格式输出书籍摘要")]
    dump: bool,

    /// 配置文件
    #[arg(long, help = "YAML格式的读取配置文件")]
    config: Option<String>,
}

/// 目录树显示样式
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    /// 树状符号
    Tree,
    /// 缩进列表
    Indented,
}

impl From<StyleArg> for TocTreeStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Tree => TocTreeStyle::TreeSymbols,
            StyleArg::Indented => TocTreeStyle::Indented,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "处理EPUB文件失败");
            eprintln!("❌ 错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ReaderConfig::from_file(path)?,
        None => ReaderConfig::default(),
    };

    let book = Book::from_path_with_config(&args.epub_file, &config)?;

    if args.dump {
        return dump(&book);
    }

    println!("📚 {}", book.title().unwrap_or_else(|_| "(无标题)".to_string()));
    println!("  📦 OPF文件: {}", book.opf_path());
    println!("  📄 章节数: {}", book.chapter_count());
    if let Some(location) = book.toc_location() {
        println!("  🌳 目录: {} ({})", location.path, location.format);
    }

    if args.metadata {
        display_metadata(&book);
    }

    if args.toc {
        display_table_of_contents(&book, args.style.into());
    }

    if let Some(chapter_index) = args.chapter {
        display_chapter_content(&book, chapter_index, args.max_length);
    }

    Ok(())
}

fn display_metadata(book: &Book) {
    println!("\n📊 EPUB元数据信息:");
    if let Some(version) = book.package().version() {
        println!("  📖 EPUB版本: {}", version);
    }

    let metadata = book.all_metadata();
    if metadata.is_empty() {
        println!("  (没有元数据)");
        return;
    }
    for (key, values) in metadata.iter() {
        println!("  {}: {}", key, values.join(" | "));
    }
}

fn display_table_of_contents(book: &Book, style: TocTreeStyle) {
    println!("\n🌳 目录树:");
    match book.toc() {
        Some(toc) => {
            let view = TocTreeView::new(toc)
                .with_title(book.title().ok())
                .with_style(style);
            print!("{}", view);
            println!(
                "\n目录统计: {} 个条目, {} 个叶子节点, 最大深度: {}",
                toc.len(),
                toc.leaves().len(),
                toc.max_depth()
            );
        }
        None => println!("  这本书没有目录"),
    }
}

fn display_chapter_content(book: &Book, chapter_index: usize, max_length: usize) {
    println!("\n📖 章节内容:");

    // 用户输入从1开始
    let chapter = match chapter_index.checked_sub(1).map(|index| book.chapter_by_index(index)) {
        Some(Ok(chapter)) => chapter,
        _ => {
            println!("  ❌ 无效的章节索引: {}。可用范围: 1-{}", chapter_index, book.chapter_count());
            for (i, chapter) in book.chapters().iter().enumerate() {
                println!("    {}. {} ({})", i + 1, chapter.title().unwrap_or(chapter.id()), chapter.path());
            }
            return;
        }
    };

    println!("  📄 章节 {}: {}", chapter_index, chapter.title().unwrap_or("(无标题)"));
    println!("  🆔 清单ID: {}", chapter.id());
    println!("  📁 源文件: {}", chapter.path());
    if chapter.has_images() {
        println!("  🖼️  图片: {}", chapter.images().join(", "));
    }

    let content = chapter.text();
    let total = content.chars().count();
    println!("  📏 内容长度: {} 字符", total);

    let display_content = if max_length > 0 && total > max_length {
        println!("  ✂️  内容已截断到 {} 字符", max_length);
        content.chars().take(max_length).collect()
    } else {
        content
    };

    println!("\n{}", "━".repeat(20));
    println!("{}", display_content);
    println!("{}", "━".repeat(20));

    if max_length > 0 && total > max_length {
        println!("  💡 提示: 还有 {} 个字符未显示。使用 --max-length 0 显示完整内容。", total - max_length);
    }
}

/// YAML摘要
#[derive(Serialize)]
struct BookSummary<'a> {
    opf_path: &'a str,
    container: &'a bookloom::Container,
    metadata: bookloom::MetadataView,
    toc: Vec<&'a bookloom::TocNode>,
    chapters: &'a [bookloom::Chapter],
}

fn dump(book: &Book) -> Result<()> {
    let summary = BookSummary {
        opf_path: book.opf_path(),
        container: book.container(),
        metadata: book.all_metadata(),
        toc: book.toc().map(|toc| toc.children.iter().collect()).unwrap_or_default(),
        chapters: book.chapters(),
    };
    let yaml = serde_yml::to_string(&summary)
        .map_err(|e| bookloom::EpubError::Config(format!("无法序列化书籍摘要: {}", e)))?;
    print!("{}", yaml);
    Ok(())
}
