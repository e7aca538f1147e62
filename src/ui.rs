//! Line-based menu shell. All prompting, parsing, and re-prompting lives
//! here; only validated primitives (trimmed strings, parsed integers) reach
//! the service layer, and every service outcome is rendered as text rather
//! than terminating the process.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::error::LibraryError;
use crate::service::LibraryService;

/// Drive the menu loop until the user exits or stdin closes. The service is
/// flushed by the caller afterwards, not here.
pub fn run_menu(service: &mut LibraryService) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        print_menu();
        let Some(choice) = read_line(&mut input, "Enter choice: ")? else {
            // stdin closed; treat like a clean exit.
            return Ok(());
        };

        match choice.as_str() {
            "1" => add_book(service, &mut input)?,
            "2" => register_member(service, &mut input)?,
            "3" => borrow_book(service, &mut input)?,
            "4" => return_book(service, &mut input)?,
            "5" => search_books(service, &mut input)?,
            "6" => search_members(service, &mut input)?,
            "7" => list_books(service, &mut input)?,
            "8" => println!("{}", service.all_members_report()),
            "9" => println!("{}", service.statistics_report()),
            "10" => delete_book(service, &mut input)?,
            "11" => remove_member(service, &mut input)?,
            "12" => println!("{}", service.data_files_report()),
            "13" => match service.save_all() {
                Ok(()) => println!("All library data saved."),
                Err(err) => println!("Save failed: {err}"),
            },
            "0" | "q" | "exit" => return Ok(()),
            other => println!("Unknown choice: '{other}'"),
        }
    }
}

fn print_menu() {
    println!();
    println!("=== LIBRARY CATALOG MANAGER ===");
    println!(" 1. Add a new book");
    println!(" 2. Register a new member");
    println!(" 3. Borrow a book");
    println!(" 4. Return a book");
    println!(" 5. Search books");
    println!(" 6. Search members");
    println!(" 7. List books");
    println!(" 8. List members");
    println!(" 9. Statistics");
    println!("10. Delete a book");
    println!("11. Remove a member");
    println!("12. Data files info");
    println!("13. Save all data");
    println!(" 0. Exit");
}

fn add_book(service: &mut LibraryService, input: &mut impl BufRead) -> Result<()> {
    let Some(title) = prompt_nonempty(input, "Title: ")? else {
        return Ok(());
    };
    let Some(author) = prompt_nonempty(input, "Author: ")? else {
        return Ok(());
    };
    let Some(raw_isbn) = read_line(input, "ISBN (blank to generate): ")? else {
        return Ok(());
    };

    let isbn = if raw_isbn.is_empty() {
        None
    } else {
        match raw_isbn.parse::<u64>() {
            Ok(value) => Some(value),
            Err(_) => {
                println!("'{raw_isbn}' is not a valid ISBN.");
                return Ok(());
            }
        }
    };

    match service.add_new_book(&title, &author, isbn) {
        Ok(isbn) => println!("Book added with ISBN {isbn}."),
        Err(err) => report(err),
    }
    Ok(())
}

fn register_member(service: &mut LibraryService, input: &mut impl BufRead) -> Result<()> {
    let Some(name) = prompt_nonempty(input, "Member name: ")? else {
        return Ok(());
    };
    match service.register_member(&name) {
        Ok(member_id) => println!("Member registered with ID {member_id}."),
        Err(err) => report(err),
    }
    Ok(())
}

fn borrow_book(service: &mut LibraryService, input: &mut impl BufRead) -> Result<()> {
    let Some(member_id) = prompt_u64(input, "Member ID: ")? else {
        return Ok(());
    };
    let Some(isbn) = prompt_u64(input, "ISBN: ")? else {
        return Ok(());
    };
    match service.borrow_book(member_id, isbn) {
        Ok(()) => println!("Book {isbn} checked out to member {member_id}."),
        Err(err) => report(err),
    }
    Ok(())
}

fn return_book(service: &mut LibraryService, input: &mut impl BufRead) -> Result<()> {
    let Some(member_id) = prompt_u64(input, "Member ID: ")? else {
        return Ok(());
    };
    let Some(isbn) = prompt_u64(input, "ISBN: ")? else {
        return Ok(());
    };
    match service.return_book(member_id, isbn) {
        Ok(()) => println!("Book {isbn} returned by member {member_id}."),
        Err(err) => report(err),
    }
    Ok(())
}

fn search_books(service: &LibraryService, input: &mut impl BufRead) -> Result<()> {
    println!("1. By title  2. By author  3. By ISBN");
    let Some(choice) = read_line(input, "Search by: ")? else {
        return Ok(());
    };
    match choice.as_str() {
        "1" => {
            let Some(term) = prompt_nonempty(input, "Title contains: ")? else {
                return Ok(());
            };
            print_result(service.find_books_by_title(&term));
        }
        "2" => {
            let Some(term) = prompt_nonempty(input, "Author contains: ")? else {
                return Ok(());
            };
            print_result(service.find_books_by_author(&term));
        }
        "3" => {
            let Some(isbn) = prompt_u64(input, "ISBN: ")? else {
                return Ok(());
            };
            print_result(service.find_book_by_isbn(isbn));
        }
        other => println!("Unknown choice: '{other}'"),
    }
    Ok(())
}

fn search_members(service: &LibraryService, input: &mut impl BufRead) -> Result<()> {
    println!("1. By ID  2. By name  3. Borrowed books of a member");
    let Some(choice) = read_line(input, "Search by: ")? else {
        return Ok(());
    };
    match choice.as_str() {
        "1" => {
            let Some(member_id) = prompt_u64(input, "Member ID: ")? else {
                return Ok(());
            };
            print_result(service.find_member_by_id(member_id));
        }
        "2" => {
            let Some(term) = prompt_nonempty(input, "Name contains: ")? else {
                return Ok(());
            };
            print_result(service.find_members_by_name(&term));
        }
        "3" => {
            let Some(member_id) = prompt_u64(input, "Member ID: ")? else {
                return Ok(());
            };
            print_result(service.member_borrowed_books(member_id));
        }
        other => println!("Unknown choice: '{other}'"),
    }
    Ok(())
}

fn list_books(service: &LibraryService, input: &mut impl BufRead) -> Result<()> {
    println!("1. All  2. Available  3. Borrowed");
    let Some(choice) = read_line(input, "List: ")? else {
        return Ok(());
    };
    match choice.as_str() {
        "1" => println!("{}", service.all_books_report()),
        "2" => println!("{}", service.available_books_report()),
        "3" => println!("{}", service.borrowed_books_report()),
        other => println!("Unknown choice: '{other}'"),
    }
    Ok(())
}

fn delete_book(service: &mut LibraryService, input: &mut impl BufRead) -> Result<()> {
    let Some(isbn) = prompt_u64(input, "ISBN to delete: ")? else {
        return Ok(());
    };
    match service.delete_book(isbn) {
        Ok(()) => println!("Book {isbn} deleted."),
        Err(err) => report(err),
    }
    Ok(())
}

fn remove_member(service: &mut LibraryService, input: &mut impl BufRead) -> Result<()> {
    let Some(member_id) = prompt_u64(input, "Member ID to remove: ")? else {
        return Ok(());
    };
    match service.remove_member(member_id) {
        Ok(()) => println!("Member {member_id} removed."),
        Err(err) => report(err),
    }
    Ok(())
}

/// Print a prompt and read one trimmed line. `None` means stdin closed.
fn read_line(input: &mut impl BufRead, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Re-prompt until a non-empty line arrives. `None` means stdin closed.
fn prompt_nonempty(input: &mut impl BufRead, prompt: &str) -> Result<Option<String>> {
    loop {
        match read_line(input, prompt)? {
            None => return Ok(None),
            Some(line) if line.is_empty() => println!("Input cannot be empty."),
            Some(line) => return Ok(Some(line)),
        }
    }
}

/// Re-prompt until a parseable unsigned number arrives. `None` means stdin
/// closed.
fn prompt_u64(input: &mut impl BufRead, prompt: &str) -> Result<Option<u64>> {
    loop {
        match read_line(input, prompt)? {
            None => return Ok(None),
            Some(line) => match line.parse::<u64>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => println!("'{line}' is not a valid number."),
            },
        }
    }
}

fn print_result(result: Result<String, LibraryError>) {
    match result {
        Ok(text) => println!("{text}"),
        Err(err) => report(err),
    }
}

fn report(err: LibraryError) {
    println!("Error: {err}");
}
