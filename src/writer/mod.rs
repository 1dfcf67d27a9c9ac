mod redirect;
mod text;

pub use redirect::Redirect;
pub use text::Text;

use crate::http::response::Response;

/// A value that knows how to write itself into a [`Response`].
pub trait Piece {
    fn render(self, res: &mut Response);
}

impl Piece for &'static str {
    fn render(self, res: &mut Response) {
        Text::Plain(self).render(res);
    }
}

impl Piece for String {
    fn render(self, res: &mut Response) {
        Text::Plain(self).render(res);
    }
}
