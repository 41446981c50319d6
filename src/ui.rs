// src/ui.rs

use crate::{constants, session::Frontend, symbols};
use async_trait::async_trait;
use colored::*;
use log::warn;
use std::io::{self, Write};

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

pub fn box_message(title: &str, content: &[&str], color_func: fn(ColoredString) -> ColoredString) {
    let rule = "─".repeat(constants::UI_WIDTH - 2);
    println!("\n┌{}┐", rule);
    println!("  {}", color_func(title.bold()));
    println!("├{}┤", rule);
    for line in content {
        println!("  {}", line);
    }
    println!("└{}┘", rule);
}

/// 读取一行输入，空输入时返回默认值
pub fn prompt(message: &str, default: Option<&str>) -> io::Result<String> {
    let hint = default.map_or(String::new(), |d| format!(" (默认: {})", d));
    print!("\n>>> {}{}: ", message, hint);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "输入已关闭"));
    }
    let input = input.trim();
    Ok(if input.is_empty() {
        default.unwrap_or_default().to_string()
    } else {
        input.to_string()
    })
}

pub fn prompt_hidden(message: &str) -> io::Result<String> {
    print!("\n>>> {}: ", message);
    io::stdout().flush()?;
    rpassword::read_password()
}

pub fn confirm(question: &str, default_yes: bool) -> bool {
    let options = if default_yes { "(Y/n)" } else { "(y/N)" };
    loop {
        let Ok(choice) = prompt(&format!("{} {}", question, options), None) else {
            return false;
        };
        match choice.to_lowercase().as_str() {
            "y" | "yes" => return true,
            "n" | "no" => return false,
            "" => return default_yes,
            _ => println!("{}", "无效输入，请输入 'y' 或 'n'。".red()),
        }
    }
}

/// 打印编号菜单并读取选择
pub fn selection_menu(options: &[String], title: &str, instructions: &str) -> String {
    let rule = "─".repeat(constants::UI_WIDTH - 2);
    println!("\n┌{}┐", rule);
    println!("  {}", title.cyan().bold());
    println!("├{}┤", rule);

    let pad = options.len().to_string().len();
    for (i, option) in options.iter().enumerate() {
        println!("  [{}] {}", format!("{:>pad$}", i + 1, pad = pad).yellow(), option);
    }

    println!("├{}┤", rule);
    println!("  {} (按 {} 可退出)", instructions, *symbols::CTRL_C);
    println!("└{}┘", rule);

    prompt("请输入你的选择", None).unwrap_or_default()
}

/// 控制台上的确认框与提示
pub struct ConsoleFrontend;

#[async_trait]
impl Frontend for ConsoleFrontend {
    async fn confirm(&self, message: &str) -> bool {
        let message = message.to_string();
        match tokio::task::spawn_blocking(move || confirm(&message, false)).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("读取确认输入失败: {}", e);
                false
            }
        }
    }

    fn alert(&self, message: &str) {
        eprintln!("\n{} {}", *symbols::WARN, message.yellow());
    }
}
