//! User-facing message texts. The bot speaks Russian; keep every
//! user-visible string here so the services and handlers stay readable.

// Prompts
pub const SEARCH_PROMPT: &str = "Поиск: ";
pub const SETTINGS_PROMPT: &str = "Настройки: ";
pub const SETTINGS_TITLE: &str = "Настройки:";
pub const LANGS_TITLE: &str = "Языки:";
pub const BETA_TITLE: &str = "Бета тест \n(список функций на тестировании /beta_functions ):";
pub const UPDATE_LOG_PROMPT: &str = "Обновления за: ";
pub const SEQUENCE_FORMAT_PROMPT: &str = "Скачать серию: ";

// Not-found and failure notices
pub const BOOK_NOT_FOUND: &str = "Книга не найдена!";
pub const AUTHOR_NOT_FOUND: &str = "Автор не найден!";
pub const BOOKS_NOT_FOUND: &str = "Книги не найдены!";
pub const AUTHOR_BOOKS_NOT_FOUND: &str = "Ошибка! Книги не найдены!";
pub const SEQUENCES_NOT_FOUND: &str = "Ошибка! Серии не найдены!";
pub const SEQUENCE_BOOKS_NOT_FOUND: &str = "Ошибка! Книги в серии не найдены!";
pub const UPDATES_NOT_FOUND: &str = "Обновления не найдены!";
pub const BOOK_ANNOTATION_NOT_FOUND: &str = "Нет аннотации для этой книги!";
pub const AUTHOR_ANNOTATION_NOT_FOUND: &str = "Нет информации для этого автора!";
pub const SOMETHING_WRONG: &str = "Произошла ошибка :( Попробуйте позже";
pub const TRY_AGAIN: &str = "Ошибка :( Попробуйте еще раз!";
pub const DOWNLOAD_ERROR: &str = "Ошибка! Попробуйте позже :(";
pub const RANDOM_UNAVAILABLE: &str = "Пока бот не может это сделать, но скоро это исправят!";
pub const NEED_LANGS: &str = "Нужно выбрать хотя бы один язык! /settings";

// Delivery
pub const CACHE_REMOVED: &str = "Кеш сброшен! Отправляю книгу заново...";
pub const SEQUENCE_SENDING: &str = "✅ Книги отправляются!";
pub const DOWNLOAD_SEQUENCE: &str = "⬇️ Скачать серию";
pub const BROKEN_FILE: &str = "Не открывается!";
pub const SHARE: &str = "Поделиться";
pub const DOWNLOAD: &str = "Скачать";

// Buttons
pub const SEARCH_BY_TITLE: &str = "По названию";
pub const SEARCH_BY_AUTHOR: &str = "По авторам";
pub const SEARCH_BY_SEQUENCE: &str = "По сериям";
pub const VIEW_ANNOTATION: &str = "Посмотреть аннотацию";
pub const BACK: &str = "Назад";
pub const SETTINGS_BACK: &str = "⬅️ Назад";
pub const SETTINGS_LANGS: &str = "Языки";
pub const SETTINGS_BETA: &str = "Бета тест";
pub const UPDATE_LOG_1_DAY: &str = "За 1 день";
pub const UPDATE_LOG_3_DAYS: &str = "За 3 дня";
pub const UPDATE_LOG_7_DAYS: &str = "За 7 дней";
pub const UPDATE_LOG_30_DAYS: &str = "За 30 дней";

pub fn greeting(first_name: &str) -> String {
    format!(
        "Привет, {first_name}!\n\
         Этот бот поможет тебе найти и скачать книги.\n\n\
         Чтобы начать поиск, просто отправь название книги, имя автора \
         или название серии.\n\n\
         Команды: /help"
    )
}

pub const HELP: &str = "\
Как пользоваться ботом:

1. Отправь сообщение с названием книги, именем автора или названием серии.
2. Выбери тип поиска кнопкой под сообщением.
3. В списке результатов нажми на команду скачивания нужного формата.

Команды:
/random_book - случайная книга
/random_author - случайный автор
/random_series - случайная серия
/update_log - обновления каталога
/settings - настройки языков поиска
/help - эта справка";

pub const BETA_FUNCTIONS: &str = "\n\
Функции на тестировании:\n\n\
1. Загрузка всех книг серии\n\
Выбирается приоритетный формат для загрузки. \n\
Загружаются все книги в выбранном формате, если нет возможности загрузить \
в этом формате, то загружается в доступном.\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_includes_name() {
        let text = greeting("Аня");
        assert!(text.starts_with("Привет, Аня!"));
        assert!(text.contains("/help"));
    }
}
