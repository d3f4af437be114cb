use crate::messaging::types::{InlineButton, InlineKeyboard};

/// Listing page size, shared by every paginated view.
pub const ELEMENTS_ON_PAGE: u32 = 7;
/// How far the `<<`/`>>` buttons jump.
pub const PAGE_JUMP: u32 = 5;

pub fn page_count(count: u32, page_size: u32) -> u32 {
    count / page_size + u32::from(count % page_size != 0)
}

pub fn page_footer(page: u32, total_pages: u32) -> String {
    format!("\n\n<code>Страница {page}/{total_pages}</code>")
}

/// Build the navigation keyboard for a paginated view, or `None` when there
/// is nothing to navigate.
///
/// Row one steps one page back/forward, row two jumps `PAGE_JUMP` pages
/// (clamped to the valid range and dropped when the jump would land on the
/// same page as the single step). Each button's callback data is
/// `{prefix}_{target_page}`. `single_step_only` suppresses the jump row,
/// which annotation pages use.
pub fn page_keyboard(
    page: u32,
    total_pages: u32,
    prefix: &str,
    single_step_only: bool,
) -> Option<InlineKeyboard> {
    if total_pages <= 1 {
        return None;
    }

    let mut first_row = Vec::new();
    let mut second_row = Vec::new();

    if page > 1 {
        let back = page.saturating_sub(PAGE_JUMP).max(1);
        if back != page - 1 && !single_step_only {
            second_row.push(InlineButton::callback(
                format!("<< {back}"),
                format!("{prefix}_{back}"),
            ));
        }
        first_row.push(InlineButton::callback("<", format!("{prefix}_{}", page - 1)));
    }

    if page != total_pages {
        let forward = (page + PAGE_JUMP).min(total_pages);
        if forward != page + 1 && !single_step_only {
            second_row.push(InlineButton::callback(
                format!(">> {forward}"),
                format!("{prefix}_{forward}"),
            ));
        }
        first_row.push(InlineButton::callback(">", format!("{prefix}_{}", page + 1)));
    }

    let mut keyboard = InlineKeyboard::default();
    if !first_row.is_empty() {
        keyboard = keyboard.row(first_row);
    }
    if !second_row.is_empty() {
        keyboard = keyboard.row(second_row);
    }
    Some(keyboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::types::ButtonAction;

    fn callback_data(button: &InlineButton) -> &str {
        match &button.action {
            ButtonAction::Callback(data) => data,
            other => panic!("expected callback action, got {other:?}"),
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 7), 0);
        assert_eq!(page_count(1, 7), 1);
        assert_eq!(page_count(14, 7), 2);
        assert_eq!(page_count(15, 7), 3);
    }

    #[test]
    fn single_page_has_no_keyboard() {
        assert_eq!(page_keyboard(1, 1, "b", false), None);
        assert_eq!(page_keyboard(1, 0, "b", false), None);
    }

    #[test]
    fn first_page_of_two_has_only_next() {
        let kb = page_keyboard(1, 2, "b", false).unwrap();
        assert_eq!(kb.rows.len(), 1);
        assert_eq!(kb.rows[0].len(), 1);
        assert_eq!(kb.rows[0][0].label, ">");
        assert_eq!(callback_data(&kb.rows[0][0]), "b_2");
    }

    #[test]
    fn middle_page_has_steps_and_jumps() {
        let kb = page_keyboard(3, 10, "a", false).unwrap();
        assert_eq!(kb.rows.len(), 2);

        assert_eq!(kb.rows[0][0].label, "<");
        assert_eq!(callback_data(&kb.rows[0][0]), "a_2");
        assert_eq!(kb.rows[0][1].label, ">");
        assert_eq!(callback_data(&kb.rows[0][1]), "a_4");

        assert_eq!(kb.rows[1][0].label, "<< 1");
        assert_eq!(callback_data(&kb.rows[1][0]), "a_1");
        assert_eq!(kb.rows[1][1].label, ">> 8");
        assert_eq!(callback_data(&kb.rows[1][1]), "a_8");
    }

    #[test]
    fn jumps_collapsing_onto_steps_are_dropped() {
        // On page 2 of 3 both jumps clamp onto the adjacent pages.
        let kb = page_keyboard(2, 3, "s", false).unwrap();
        assert_eq!(kb.rows.len(), 1);
        assert_eq!(kb.rows[0].len(), 2);
    }

    #[test]
    fn single_step_only_suppresses_jump_row() {
        let kb = page_keyboard(10, 40, "b_ann_5", true).unwrap();
        assert_eq!(kb.rows.len(), 1);
        assert_eq!(callback_data(&kb.rows[0][0]), "b_ann_5_9");
        assert_eq!(callback_data(&kb.rows[0][1]), "b_ann_5_11");
    }

    #[test]
    fn last_page_has_only_back_controls() {
        let kb = page_keyboard(10, 10, "b", false).unwrap();
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.rows[0].len(), 1);
        assert_eq!(kb.rows[0][0].label, "<");
        assert_eq!(kb.rows[1][0].label, "<< 5");
    }

    #[test]
    fn footer_names_page_and_total() {
        assert_eq!(page_footer(2, 9), "\n\n<code>Страница 2/9</code>");
    }
}
