pub const REQUIRED_FIELD: &str = "Это поле обязательно для заполнения";
pub const ATTACHMENT_REQUIRED: &str = "Необходимо загрузить хотя бы один файл";
pub const INVALID_NUMBER: &str = "Введите корректное положительное число";
pub const EXCEEDS_NEW_LEADS: &str = "Не может быть больше общего количества новых лидов";
pub const COMMENTS_TOO_LONG: &str = "Комментарий не должен превышать 500 символов";
pub const DEAL_AMOUNT_ADVISORY: &str = "При наличии закрытых сделок необходимо указать сумму";

pub const UNSUPPORTED_FILE_TYPE: &str =
    "Поддерживаются только изображения (JPEG, PNG, GIF) и PDF файлы";
pub const FILE_TOO_LARGE: &str = "Размер файла не должен превышать 10MB";

pub const FORM_INCOMPLETE: &str = "Пожалуйста, заполните все обязательные поля";
pub const SUBMISSION_FAILED: &str = "Произошла ошибка при отправке отчета. Попробуйте еще раз.";
pub const SUBMISSION_SUCCEEDED: &str = "Отчет успешно отправлен";

pub const MAIN_BUTTON_TEXT: &str = "Отправить отчет";
pub const CONFIRM_DISCARD: &str =
    "У вас есть несохраненные изменения. Вы уверены, что хотите выйти?";
