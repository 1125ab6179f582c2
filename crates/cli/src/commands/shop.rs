//! Interactive shopping session.
//!
//! # Usage
//!
//! ```bash
//! kashly shop
//! > search https://www.amazon.com/dp/B08N5WRWNW
//! > add
//! > cart
//! > checkout
//! > order
//! ```

use std::fmt::Write as _;
use std::io::Write as _;

use kashly_core::{AddressField, ProductId, ShippingAddress};
use kashly_storefront::config::StorefrontConfig;
use kashly_storefront::navigation::{Intent, NavigationError, Screen, View};
use kashly_storefront::pricing::{Cart, Order, PricingService, ProductQuote, SAMPLE_PRODUCTS};
use kashly_storefront::{Shop, ShopError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::{CommandError, client};

const HELP: &str = "\
Commands:
  search <url>       look up a product by its store URL
  sample <asin>      load a demonstration product
  add [asin]         add a product (default: the one shown) to the cart
  qty <asin> <n>     set a quantity; 0 removes the line
  remove <asin>      remove a product from the cart
  cart               show the cart
  checkout           proceed from the cart to shipping details
  order              enter a shipping address and place the order
  continue           start shopping again after an order
  home               back to search
  help               show this help
  quit               leave";

/// A parsed line of shopper input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Search(String),
    Sample(ProductId),
    Add(Option<ProductId>),
    Quantity(ProductId, u32),
    Remove(ProductId),
    Cart,
    Checkout,
    Order,
    Continue,
    Home,
    Help,
    Quit,
}

/// Parse one line of input. Blank lines yield `None`.
fn parse(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let input = match (command.to_lowercase().as_str(), arg) {
        ("search", Some(url)) => Input::Search(url.to_owned()),
        ("search", None) => return Err("usage: search <url>".to_owned()),
        ("sample", Some(asin)) => Input::Sample(ProductId::new(asin)),
        ("sample", None) => {
            return Err(format!("usage: sample <asin> (try {})", SAMPLE_PRODUCTS.join(", ")));
        }
        ("add", asin) => Input::Add(asin.map(ProductId::new)),
        ("qty", Some(asin)) => {
            let quantity = words
                .next()
                .ok_or_else(|| "usage: qty <asin> <n>".to_owned())?;
            Input::Quantity(ProductId::new(asin), parse_quantity(quantity)?)
        }
        ("remove", Some(asin)) => Input::Remove(ProductId::new(asin)),
        ("cart", _) => Input::Cart,
        ("checkout", _) => Input::Checkout,
        ("order", _) => Input::Order,
        ("continue", _) => Input::Continue,
        ("home", _) => Input::Home,
        ("help" | "?", _) => Input::Help,
        ("quit" | "exit", _) => Input::Quit,
        (other, _) => return Err(format!("unknown command '{other}', type 'help'")),
    };

    Ok(Some(input))
}

/// Quantities at or below zero mean "remove".
fn parse_quantity(raw: &str) -> Result<u32, String> {
    let n: i64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a whole number"))?;
    u32::try_from(n.max(0)).map_err(|_| format!("quantity {n} is too large"))
}

/// Run the interactive session until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the terminal fails.
/// Shopping errors are printed and the session continues.
#[allow(clippy::print_stdout)]
pub async fn run(config: &StorefrontConfig) -> Result<(), CommandError> {
    let shop = Shop::new(client(config)?);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Kashly - cash on delivery shopping");
    println!("Samples: {}", SAMPLE_PRODUCTS.join(", "));
    println!("Type 'help' for commands.");

    loop {
        prompt(&format!("[{} | cart {}] > ", shop.screen(), shop.cart().item_count()))?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let input = match parse(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(usage) => {
                println!("{usage}");
                continue;
            }
        };
        if input == Input::Quit {
            break;
        }

        let from = shop.screen();
        let outcome = execute(&shop, input, &mut lines).await?;
        record_navigation(from, shop.screen());

        match outcome {
            Ok(output) => println!("{output}"),
            Err(e) => println!("error [{}]: {}", e.class(), e.user_message()),
        }
    }

    Ok(())
}

/// Go back to search unless the current screen can show a lookup result.
///
/// A product already on screen stays there until a new one replaces it.
fn leave_for_search<S: PricingService>(shop: &Shop<S>) {
    if !shows_lookups(shop.screen()) {
        shop.open_search();
    }
}

const fn shows_lookups(screen: Screen) -> bool {
    matches!(screen, Screen::Search | Screen::Product)
}

fn order_unavailable(from: Screen) -> ShopError {
    NavigationError {
        from,
        intent: Intent::CompleteOrder,
    }
    .into()
}

/// Apply one input to the session and render the result.
///
/// The outer `Result` is a terminal failure; the inner one a shopping error.
async fn execute<S: PricingService>(
    shop: &Shop<S>,
    input: Input,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<Result<String, ShopError>, CommandError> {
    let outcome = match input {
        Input::Search(url) => {
            leave_for_search(shop);
            shop.lookup(&url).await.map(|notice| show_view(shop, &notice.to_string()))
        }
        Input::Sample(product_id) => {
            leave_for_search(shop);
            shop.load_sample(&product_id)
                .await
                .map(|notice| show_view(shop, &notice.to_string()))
        }
        Input::Add(product_id) => {
            let product_id = product_id.or_else(|| shop.view().product().map(|q| q.asin.clone()));
            match product_id {
                Some(product_id) => shop.add_to_cart(&product_id).await.map(|n| n.to_string()),
                None => Ok("No product shown; use 'add <asin>'".to_owned()),
            }
        }
        Input::Quantity(product_id, quantity) => shop
            .set_quantity(&product_id, quantity)
            .await
            .map(|notice| format!("{notice}\n{}", render_cart(&shop.cart()))),
        Input::Remove(product_id) => shop
            .remove_from_cart(&product_id)
            .await
            .map(|notice| format!("{notice}\n{}", render_cart(&shop.cart()))),
        Input::Cart => {
            shop.open_cart();
            Ok(render_cart(&shop.cart()))
        }
        Input::Checkout => shop
            .checkout()
            .map(|()| "Shipping details needed; type 'order' to enter them".to_owned()),
        Input::Order => {
            if shop.screen() == Screen::Checkout {
                let shipping = read_address(lines).await?;
                shop.place_order(&shipping)
                    .await
                    .map(|notice| show_view(shop, &notice.to_string()))
            } else {
                Err(order_unavailable(shop.screen()))
            }
        }
        Input::Continue => shop
            .continue_shopping()
            .map(|()| "Ready for the next product".to_owned()),
        Input::Home => {
            shop.open_search();
            Ok(format!("Samples: {}", SAMPLE_PRODUCTS.join(", ")))
        }
        Input::Help => Ok(HELP.to_owned()),
        Input::Quit => Ok(String::new()),
    };

    Ok(outcome)
}

/// Prompt for each address field in form order.
async fn read_address(
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<ShippingAddress, CommandError> {
    let mut shipping = ShippingAddress::default();

    for field in AddressField::ALL {
        let current = shipping.get(field).unwrap_or_default().to_owned();
        let label = if current.is_empty() {
            format!("{field}: ")
        } else {
            format!("{field} [{current}]: ")
        };
        prompt(&label)?;

        let value = lines.next_line().await?.unwrap_or_default();
        let value = value.trim();
        if !value.is_empty() || current.is_empty() {
            shipping.set(field, value);
        }
    }

    Ok(shipping)
}

fn show_view<S: PricingService>(shop: &Shop<S>, notice: &str) -> String {
    match shop.view() {
        View::ViewingProduct(quote) => format!("{notice}\n{}", render_product(&quote)),
        View::OrderComplete(order) => format!("{notice}\n{}", render_order(&order)),
        _ => notice.to_owned(),
    }
}

fn prompt(text: &str) -> Result<(), CommandError> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Leave a Sentry breadcrumb when the screen changes.
fn record_navigation(from: Screen, to: Screen) {
    if from == to {
        return;
    }
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some("navigation".to_owned()),
        message: Some(format!("{from} -> {to}")),
        level: sentry::Level::Info,
        ..Default::default()
    });
}

// =============================================================================
// Rendering
// =============================================================================

fn render_product(quote: &ProductQuote) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", quote.title, quote.asin);
    if let Some(seller) = &quote.seller {
        let _ = writeln!(out, "  sold by {seller}, {}", quote.availability);
    }
    if let (Some(rating), Some(reviews)) = (quote.rating, quote.review_count) {
        let _ = writeln!(out, "  rated {rating:.1} from {reviews} reviews");
    }
    let _ = writeln!(out, "  store price  {}", quote.base_price);
    let _ = writeln!(out, "  commission   {}", quote.commission);
    let _ = writeln!(out, "  handling     {}", quote.handling);
    let _ = write!(out, "  pay on delivery {}", quote.cod_price);
    out
}

fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty".to_owned();
    }

    let mut out = String::new();
    for item in &cart.items {
        let _ = writeln!(
            out,
            "  {} x{}  {}  ({})",
            item.product.title,
            item.quantity,
            item.product.cod_price * item.quantity,
            item.asin
        );
    }
    let _ = writeln!(out, "  subtotal     {}", cart.subtotal);
    let _ = writeln!(out, "  commission   {}", cart.total_commission);
    let _ = writeln!(out, "  handling     {}", cart.total_handling);
    let _ = write!(out, "  total due on delivery {}", cart.total);
    out
}

/// Order summary shared with `kashly order`.
pub fn render_order(order: &Order) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order {} ({})", order.id, order.status);
    let _ = writeln!(
        out,
        "  {} item(s), {} due by {}",
        order.cart.total_quantity(),
        order.cart.total,
        order.payment_method
    );
    let _ = write!(
        out,
        "  ship to {}, {}, {} {}",
        order.shipping.full_name, order.shipping.city, order.shipping.state, order.shipping.country
    );
    if let Some(created_at) = order.created_at {
        let _ = write!(out, "\n  placed {}", created_at.format("%Y-%m-%d %H:%M UTC"));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse("search https://amzn.to/x").unwrap(),
            Some(Input::Search("https://amzn.to/x".to_owned()))
        );
        assert_eq!(parse("ADD").unwrap(), Some(Input::Add(None)));
        assert_eq!(
            parse("add B08N5WRWNW").unwrap(),
            Some(Input::Add(Some(ProductId::new("B08N5WRWNW"))))
        );
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("quit").unwrap(), Some(Input::Quit));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(
            parse("qty X1 3").unwrap(),
            Some(Input::Quantity(ProductId::new("X1"), 3))
        );
        assert_eq!(
            parse("qty X1 -2").unwrap(),
            Some(Input::Quantity(ProductId::new("X1"), 0))
        );
        assert!(parse("qty X1").is_err());
        assert!(parse("qty X1 many").is_err());
        assert!(parse("qty X1 99999999999").is_err());
    }

    #[test]
    fn test_lookups_keep_product_screen() {
        assert!(shows_lookups(Screen::Search));
        assert!(shows_lookups(Screen::Product));
        assert!(!shows_lookups(Screen::Cart));
        assert!(!shows_lookups(Screen::Checkout));
        assert!(!shows_lookups(Screen::Success));
    }

    #[test]
    fn test_order_outside_checkout_is_invalid_transition() {
        let err = order_unavailable(Screen::Cart);

        assert!(matches!(
            &err,
            ShopError::InvalidTransition(e)
                if e.from == Screen::Cart && e.intent == Intent::CompleteOrder
        ));
        assert_eq!(err.user_message(), "Not available here: complete order");
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = parse("buy X1").unwrap_err();
        assert!(err.contains("unknown command 'buy'"));
        assert!(parse("search").is_err());
    }

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render_cart(&Cart::default()), "Your cart is empty");
    }
}
